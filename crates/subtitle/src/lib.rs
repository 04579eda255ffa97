//! # Timed-text parsing and playback synchronization
//!
//! Recordings come back from the backend with a block-structured subtitle
//! payload (SubRip-shaped: sequence number, `start --> end` line, text
//! lines). [`parse_cues`] turns that payload into an ordered cue list;
//! [`ActiveCueTracker`] keeps the "active" cue in lockstep with a live
//! playback position; [`TranscriptSync`] binds the tracker to an injected
//! [`MediaHandle`] so hosts get click-to-seek and an auto-scroll signal
//! without any ambient document lookups.

mod parser;
mod sync;
mod types;

pub use parser::parse_cues;
pub use sync::{ActiveCueTracker, MediaHandle, TranscriptSync, drive};
pub use types::{Cue, CueChange, UNTERMINATED_CUE_WINDOW};
