use thiserror::Error;

use crate::client::ClientError;

/// One stage's failure. Stages fail independently: a recorded error never
/// aborts a sibling or a downstream stage that does not depend on it.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("template fetch failed: {0}")]
    TemplateFetch(ClientError),

    #[error("log record fetch failed: {0}")]
    LogFetch(ClientError),

    #[error("signed url resolution failed: {0}")]
    SignedUrl(ClientError),

    #[error("subtitle fetch failed: {0}")]
    SubtitleFetch(ClientError),
}

/// Per-stage error slots carried in the snapshot, one per concern, so hosts
/// can degrade each surface separately (a broken subtitle fetch must not
/// block video playback). Cleared when the owning stage next succeeds.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StageErrors {
    pub template: Option<String>,
    pub log: Option<String>,
    pub signed_url: Option<String>,
    pub subtitle: Option<String>,
}

impl StageErrors {
    /// Record a failure in the slot its stage owns.
    pub(crate) fn record(&mut self, err: &StageError) {
        let slot = match err {
            StageError::TemplateFetch(_) => &mut self.template,
            StageError::LogFetch(_) => &mut self.log,
            StageError::SignedUrl(_) => &mut self.signed_url,
            StageError::SubtitleFetch(_) => &mut self.subtitle,
        };
        *slot = Some(err.to_string());
    }
}
