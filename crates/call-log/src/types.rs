use std::collections::HashSet;

use casedesk_reconcile::{SubmittedAnswer, TemplateChecklistItem, TemplateField};

/// Which log a case viewer is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogType {
    Call,
    Video,
}

impl LogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogType::Call => "call",
            LogType::Video => "video",
        }
    }
}

impl std::fmt::Display for LogType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity one session is scoped to. A different key means a different
/// session; snapshots are replaced wholesale, never merged across keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SessionKey {
    pub case_id: String,
    pub log_type: LogType,
}

impl SessionKey {
    pub fn new(case_id: impl Into<String>, log_type: LogType) -> Self {
        Self {
            case_id: case_id.into(),
            log_type,
        }
    }
}

/// Backend-reported processing state of one recording resource.
///
/// Only `in_progress` keeps the record poll alive, and only `completed`
/// (case-insensitive, matching the backend's inconsistent casing) unlocks
/// subtitle resolution. Everything else is inert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingStatus {
    InProgress,
    Completed,
    Other,
}

impl RecordingStatus {
    pub fn parse(raw: &str) -> Self {
        if raw == "in_progress" {
            RecordingStatus::InProgress
        } else if raw.eq_ignore_ascii_case("completed") {
            RecordingStatus::Completed
        } else {
            RecordingStatus::Other
        }
    }
}

/// One media resource attached to a log record. All fields are optional on
/// the wire; helpers below locate usable resources explicitly instead of
/// optional-chaining through the list.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RecordingResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl RecordingResource {
    pub fn status(&self) -> Option<RecordingStatus> {
        self.status.as_deref().map(RecordingStatus::parse)
    }
}

/// One checklist question the operator ticked during the call.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SubmittedQuestion {
    pub question_id: String,
}

/// The operator's submission for one case + log type, as returned by the
/// log endpoint. Absent entirely when nothing was recorded yet.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LogRecord {
    #[serde(default)]
    pub checklist: Vec<SubmittedQuestion>,
    #[serde(default)]
    pub structured_notes: Vec<SubmittedAnswer>,
    #[serde(default)]
    pub recordings: Vec<RecordingResource>,
}

impl LogRecord {
    pub fn submitted_ids(&self) -> HashSet<String> {
        self.checklist
            .iter()
            .map(|q| q.question_id.clone())
            .collect()
    }
}

/// The ordered, authoritative definition of what a log of this type should
/// contain.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LogTemplate {
    #[serde(default)]
    pub checklist: Vec<TemplateChecklistItem>,
    #[serde(default)]
    pub fields: Vec<TemplateField>,
}

/// Signed playback/subtitle URLs and fetched subtitle text for the current
/// record. Reset to empty at the start of every resolution attempt — no
/// stale value survives a record or key change.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResolvedMedia {
    pub playback_url: Option<String>,
    pub subtitle_url: Option<String>,
    pub subtitle_text: Option<String>,
}

/// Poll predicate: keep re-fetching the record while at least one recording
/// reports `in_progress`. An absent record stops polling.
pub fn needs_polling(record: Option<&LogRecord>) -> bool {
    record.is_some_and(|r| {
        r.recordings
            .iter()
            .any(|rec| rec.status() == Some(RecordingStatus::InProgress))
    })
}

/// First recording that has a playback key.
pub fn playback_recording(recordings: &[RecordingResource]) -> Option<&RecordingResource> {
    recordings.iter().find(|r| r.key.is_some())
}

/// First recording that has both a subtitle key and a status. Whether that
/// status actually unlocks subtitle resolution is the caller's check.
pub fn subtitle_recording(recordings: &[RecordingResource]) -> Option<&RecordingResource> {
    recordings
        .iter()
        .find(|r| r.subtitle_key.is_some() && r.status.is_some())
}
