use std::future::Future;
use std::pin::Pin;

use crate::types::{LogRecord, LogTemplate, LogType};

/// Opaque failure from a host collaborator. The pipeline records it and
/// degrades; it never inspects it.
pub type ClientError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a signed URL is being resolved for. The endpoint is the same for
/// both; the backend uses the kind to pick expiry and content-type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Playback,
    Subtitle,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Playback => "playback",
            MediaKind::Subtitle => "subtitle",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SignedUrlRequest {
    pub kind: MediaKind,
    pub key: String,
}

/// The host-supplied service layer. The core never talks to the network
/// directly; everything it needs is behind these four calls, which are the
/// pipeline's only suspension points.
///
/// # Object safety
///
/// Object-safe via the explicit [`BoxFuture`] return type — sessions hold a
/// `dyn CaseLogClient`.
pub trait CaseLogClient: Send + Sync {
    /// Ordered checklist + field definitions for one log type.
    fn fetch_template<'a>(
        &'a self,
        case_id: &'a str,
        log_type: LogType,
    ) -> BoxFuture<'a, Result<LogTemplate, ClientError>>;

    /// The operator's submission, or `None` when nothing was recorded yet.
    fn fetch_log_record<'a>(
        &'a self,
        case_id: &'a str,
        log_type: LogType,
    ) -> BoxFuture<'a, Result<Option<LogRecord>, ClientError>>;

    /// Time-limited authorization-bearing URL for a private media key, or
    /// `None` when the backend has nothing for that key. Used identically
    /// for playback and subtitle resolution.
    fn resolve_signed_url<'a>(
        &'a self,
        case_id: &'a str,
        request: SignedUrlRequest,
    ) -> BoxFuture<'a, Result<Option<String>, ClientError>>;

    /// Raw subtitle payload behind a (cross-origin) URL, forwarded by the
    /// host's proxy endpoint as plain text.
    fn fetch_proxied_text<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, ClientError>>;
}
