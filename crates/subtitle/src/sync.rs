use futures_util::{Stream, StreamExt};
use tokio::sync::watch;

use crate::types::{Cue, CueChange};

/// Live playback-position source, injected by the host.
///
/// Deliberately not an ambient lookup: the host owns the media element (or
/// player process) and hands the core an explicit handle exposing the
/// current position and a seek.
pub trait MediaHandle {
    fn position(&self) -> f64;
    fn seek(&self, seconds: f64);
}

/// Tracks which cue is active for a moving playback position.
///
/// Active-cue rule, in order:
/// 1. the first cue whose window `[start, end]` contains `t` (a cue without
///    an end gets a [`crate::UNTERMINATED_CUE_WINDOW`]-second window);
/// 2. otherwise the last cue whose `start <= t`, scanned from the end —
///    covers gaps between cues and positions past the final window;
/// 3. otherwise no active cue.
pub struct ActiveCueTracker {
    cues: Vec<Cue>,
    active: Option<usize>,
}

impl ActiveCueTracker {
    pub fn new(cues: Vec<Cue>) -> Self {
        Self { cues, active: None }
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    /// The pure selection rule, independent of tracker state.
    pub fn active_cue_at(&self, t: f64) -> Option<usize> {
        if let Some(cue) = self
            .cues
            .iter()
            .find(|c| t >= c.start_seconds && t <= c.window_end())
        {
            return Some(cue.index);
        }
        self.cues
            .iter()
            .rev()
            .find(|c| c.start_seconds <= t)
            .map(|c| c.index)
    }

    /// Feed one position update. Returns `Some` only when the active cue
    /// changed; the change carries the auto-scroll target.
    pub fn on_position(&mut self, t: f64) -> Option<CueChange> {
        let next = self.active_cue_at(t);
        if next == self.active {
            return None;
        }
        self.active = next;
        Some(CueChange {
            active: next,
            scroll_to: next,
        })
    }
}

/// Binds a cue list to a live media handle: position polling drives the
/// tracker, clicking a cue seeks.
pub struct TranscriptSync<M> {
    tracker: ActiveCueTracker,
    media: Option<M>,
}

impl<M: MediaHandle> TranscriptSync<M> {
    /// `media` is `None` when the underlying media reference could not be
    /// located; the synchronizer then renders an empty state and disables
    /// seek.
    pub fn new(cues: Vec<Cue>, media: Option<M>) -> Self {
        Self {
            tracker: ActiveCueTracker::new(cues),
            media,
        }
    }

    /// Whether there is anything to synchronize. Hosts render a
    /// "no transcript" state when false.
    pub fn has_transcript(&self) -> bool {
        self.media.is_some() && !self.tracker.cues().is_empty()
    }

    pub fn cues(&self) -> &[Cue] {
        self.tracker.cues()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.tracker.active_index()
    }

    /// Read the media position and recompute the active cue.
    pub fn refresh(&mut self) -> Option<CueChange> {
        let t = self.media.as_ref()?.position();
        self.tracker.on_position(t)
    }

    /// Seek the media to the start of the cue whose `index` field is
    /// `index`, the same identity [`CueChange`] reports. Play/pause state
    /// is untouched. Returns `false` (and does nothing) when seek is
    /// disabled: no media handle, no cues, or an unknown index.
    pub fn seek_to(&self, index: usize) -> bool {
        let Some(media) = &self.media else {
            return false;
        };
        let Some(cue) = self.tracker.cues().iter().find(|c| c.index == index) else {
            return false;
        };
        media.seek(cue.start_seconds);
        true
    }
}

/// Drive a tracker from an async stream of position updates, publishing
/// each change on a watch channel. Returns when the stream ends or every
/// receiver is gone.
pub async fn drive<S>(
    mut positions: S,
    mut tracker: ActiveCueTracker,
    tx: watch::Sender<Option<CueChange>>,
) where
    S: Stream<Item = f64> + Unpin,
{
    while let Some(t) = positions.next().await {
        if let Some(change) = tracker.on_position(t) {
            tracing::trace!(active = ?change.active, "active_cue_changed");
            if tx.send(Some(change)).is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn cue(index: usize, start: f64, end: Option<f64>, text: &str) -> Cue {
        Cue {
            index,
            start_seconds: start,
            end_seconds: end,
            text: text.to_string(),
        }
    }

    fn two_cues() -> Vec<Cue> {
        vec![
            cue(0, 1.0, Some(2.0), "Hello"),
            cue(1, 5.0, Some(6.5), "World"),
        ]
    }

    struct FakeMedia {
        position: Cell<f64>,
    }

    impl FakeMedia {
        fn at(t: f64) -> Self {
            Self {
                position: Cell::new(t),
            }
        }
    }

    impl MediaHandle for &FakeMedia {
        fn position(&self) -> f64 {
            self.position.get()
        }

        fn seek(&self, seconds: f64) {
            self.position.set(seconds);
        }
    }

    // ── active-cue rule ──────────────────────────────────────────────────

    #[test]
    fn containing_window_wins() {
        let tracker = ActiveCueTracker::new(two_cues());
        assert_eq!(tracker.active_cue_at(1.5), Some(0));
        assert_eq!(tracker.active_cue_at(5.0), Some(1));
    }

    #[test]
    fn gap_falls_back_to_last_started_cue() {
        let tracker = ActiveCueTracker::new(two_cues());
        assert_eq!(tracker.active_cue_at(3.5), Some(0));
    }

    #[test]
    fn position_before_first_cue_has_no_active() {
        let tracker = ActiveCueTracker::new(two_cues());
        assert_eq!(tracker.active_cue_at(0.2), None);
    }

    #[test]
    fn position_past_last_window_falls_back_to_last_cue() {
        let tracker = ActiveCueTracker::new(two_cues());
        assert_eq!(tracker.active_cue_at(100.0), Some(1));
    }

    #[test]
    fn missing_end_gets_ten_second_window() {
        let tracker = ActiveCueTracker::new(vec![cue(0, 1.0, None, "open")]);
        assert_eq!(tracker.active_cue_at(10.9), Some(0));
        // Past the implied window there is still a started cue to fall
        // back to, so it stays active.
        assert_eq!(tracker.active_cue_at(11.5), Some(0));
    }

    #[test]
    fn no_cues_means_no_active_cue() {
        let tracker = ActiveCueTracker::new(vec![]);
        assert_eq!(tracker.active_cue_at(3.0), None);
    }

    #[test]
    fn first_containing_match_wins_on_overlap() {
        let tracker = ActiveCueTracker::new(vec![
            cue(0, 1.0, Some(4.0), "a"),
            cue(1, 2.0, Some(5.0), "b"),
        ]);
        assert_eq!(tracker.active_cue_at(3.0), Some(0));
    }

    #[test]
    fn on_position_reports_changes_only() {
        let mut tracker = ActiveCueTracker::new(two_cues());

        let change = tracker.on_position(1.5).unwrap();
        assert_eq!(change.active, Some(0));
        assert_eq!(change.scroll_to, Some(0));

        assert!(tracker.on_position(1.8).is_none());

        let change = tracker.on_position(5.5).unwrap();
        assert_eq!(change.active, Some(1));
    }

    // ── TranscriptSync ───────────────────────────────────────────────────

    #[test]
    fn seek_sets_position_to_cue_start() {
        let media = FakeMedia::at(0.0);
        let sync = TranscriptSync::new(two_cues(), Some(&media));

        assert!(sync.seek_to(1));
        assert_eq!(media.position.get(), 5.0);
    }

    #[test]
    fn seek_disabled_without_media_or_cues() {
        let no_media: TranscriptSync<&FakeMedia> = TranscriptSync::new(two_cues(), None);
        assert!(!no_media.seek_to(0));
        assert!(!no_media.has_transcript());

        let media = FakeMedia::at(0.0);
        let no_cues = TranscriptSync::new(vec![], Some(&media));
        assert!(!no_cues.seek_to(0));
        assert!(!no_cues.has_transcript());
        assert_eq!(media.position.get(), 0.0);
    }

    #[test]
    fn seek_resolves_cues_by_index_field_not_position() {
        // Hosts may hand the synchronizer a filtered cue list whose index
        // fields no longer line up with vector positions. A seek must land
        // on the cue the tracker would report, not on whatever sits at that
        // offset.
        let media = FakeMedia::at(0.0);
        let cues = vec![cue(5, 1.0, Some(2.0), "a"), cue(9, 5.0, Some(6.5), "b")];
        let sync = TranscriptSync::new(cues.clone(), Some(&media));

        let tracker = ActiveCueTracker::new(cues);
        assert_eq!(tracker.active_cue_at(5.5), Some(9));
        assert!(sync.seek_to(9));
        assert_eq!(media.position.get(), 5.0);

        // Positional offsets that match no cue identity are rejected.
        assert!(!sync.seek_to(0));
        assert_eq!(media.position.get(), 5.0);
    }

    #[test]
    fn out_of_range_seek_is_rejected() {
        let media = FakeMedia::at(0.0);
        let sync = TranscriptSync::new(two_cues(), Some(&media));
        assert!(!sync.seek_to(7));
        assert_eq!(media.position.get(), 0.0);
    }

    #[test]
    fn refresh_tracks_media_position() {
        let media = FakeMedia::at(1.5);
        let mut sync = TranscriptSync::new(two_cues(), Some(&media));

        let change = sync.refresh().unwrap();
        assert_eq!(change.active, Some(0));
        assert!(sync.refresh().is_none());
    }

    #[tokio::test]
    async fn drive_publishes_changes_to_watch() {
        let tracker = ActiveCueTracker::new(two_cues());
        let (tx, rx) = watch::channel(None);
        let positions = tokio_stream::iter(vec![0.0, 1.5, 1.8, 5.5]);

        drive(positions, tracker, tx).await;

        let last = rx.borrow().clone().unwrap();
        assert_eq!(last.active, Some(1));
    }
}
