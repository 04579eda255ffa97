//! # Call/video-log resource resolution
//!
//! One log viewer needs four things that arrive at four different speeds:
//! the template (ordered checklist + field definitions), the log record
//! (what the operator submitted, plus recording resources), signed URLs for
//! private playback media, and the subtitle text behind one of those URLs.
//! [`LogSession`] orchestrates the whole sequence per `(case_id, log_type)`:
//!
//! - template and record fetch run independently; neither failure blocks
//!   the other;
//! - the record is re-fetched on a fixed interval while any recording still
//!   reports `in_progress`, and the instant the condition clears the timer
//!   stops;
//! - every new record re-resolves signed media URLs from a clean slate, and
//!   a completed recording with a subtitle key additionally pulls the
//!   subtitle text through the host's proxy;
//! - every state write of an in-flight resolution is guarded by a
//!   cancellation check, so a slow response for case A can never overwrite
//!   the snapshot after the viewer moved to case B.
//!
//! The network itself lives behind [`CaseLogClient`], supplied by the host.
//! Reads happen through a [`tokio::sync::watch`] snapshot channel.

mod client;
mod error;
mod session;
mod types;

pub use client::{BoxFuture, CaseLogClient, ClientError, MediaKind, SignedUrlRequest};
pub use error::{StageError, StageErrors};
pub use session::{LogSession, LogSessionHandle, LogSnapshot, POLL_INTERVAL};
pub use types::{
    LogRecord, LogTemplate, LogType, RecordingResource, RecordingStatus, ResolvedMedia,
    SessionKey, SubmittedQuestion, needs_polling, playback_recording, subtitle_recording,
};
