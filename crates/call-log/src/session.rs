use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use casedesk_reconcile::{
    ChecklistItem, Overrides, ReconciledRow, reconcile_checklist, reconcile_notes,
};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::client::{CaseLogClient, ClientError, MediaKind, SignedUrlRequest};
use crate::error::{StageError, StageErrors};
use crate::types::{
    LogRecord, LogTemplate, RecordingResource, RecordingStatus, ResolvedMedia, SessionKey,
    needs_polling, playback_recording, subtitle_recording,
};

/// Fixed record-poll interval while a recording is still processing. Not
/// configurable per call site; every session polls at the same cadence.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Aggregate read model for one `(case_id, log_type)` session. Published on
/// a watch channel; hosts read it, never write it.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct LogSnapshot {
    pub template: Option<LogTemplate>,
    pub record: Option<LogRecord>,
    /// Template checklist with derived `done` flags.
    pub checklist: Vec<ChecklistItem>,
    /// Reconciled structured-note rows, template order first.
    pub structured_rows: Vec<ReconciledRow>,
    pub media: ResolvedMedia,
    pub errors: StageErrors,
    /// True while the record poll timer is armed.
    pub polling: bool,
    #[serde(skip)]
    pub(crate) template_loading: bool,
    #[serde(skip)]
    pub(crate) record_loading: bool,
    #[serde(skip)]
    pub(crate) resolving: bool,
}

impl LogSnapshot {
    /// Single spinner flag: true while any stage is in flight or the poll
    /// timer is armed. Callers that want per-stage detail read the fields.
    pub fn loading(&self) -> bool {
        self.template_loading || self.record_loading || self.resolving || self.polling
    }
}

enum SessionCmd {
    ToggleChecklistItem(String),
}

/// Handle to a running session. Dropping it (or calling
/// [`LogSessionHandle::shutdown`]) cancels the driver and every in-flight
/// resolution; late responses are discarded, never written.
pub struct LogSessionHandle {
    key: SessionKey,
    rx: watch::Receiver<LogSnapshot>,
    cancel: CancellationToken,
    cmd_tx: mpsc::UnboundedSender<SessionCmd>,
}

impl LogSessionHandle {
    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn subscribe(&self) -> watch::Receiver<LogSnapshot> {
        self.rx.clone()
    }

    pub fn snapshot(&self) -> LogSnapshot {
        self.rx.borrow().clone()
    }

    /// Locally flip one checklist entry. The overlay is XOR'd with the
    /// record's submitted ids and the checklist recomputed wholesale.
    pub fn toggle_checklist_item(&self, id: impl Into<String>) {
        let _ = self.cmd_tx.send(SessionCmd::ToggleChecklistItem(id.into()));
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for LogSessionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Orchestration entry point. One session per `(case_id, log_type)`; when
/// the viewer navigates to a different key, drop the old handle and spawn a
/// new session — state is replaced, never merged.
pub struct LogSession;

impl LogSession {
    pub fn spawn(client: Arc<dyn CaseLogClient>, key: SessionKey) -> LogSessionHandle {
        Self::spawn_with_overrides(client, key, Overrides::new())
    }

    /// As [`LogSession::spawn`], with display-value overrides for fields
    /// whose value is computed rather than copied from the submission.
    pub fn spawn_with_overrides(
        client: Arc<dyn CaseLogClient>,
        key: SessionKey,
        overrides: Overrides<'static>,
    ) -> LogSessionHandle {
        let initial = LogSnapshot {
            template_loading: true,
            record_loading: true,
            ..Default::default()
        };
        let (tx, rx) = watch::channel(initial);
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let span = tracing::info_span!(
            "log_session",
            case_id = %key.case_id,
            log_type = %key.log_type,
        );

        let driver = Driver {
            client,
            key: key.clone(),
            tx,
            cancel: cancel.clone(),
            overrides,
            overlay: HashSet::new(),
            resolve_cancel: None,
        };
        tokio::spawn(driver.run(cmd_rx).instrument(span));

        LogSessionHandle {
            key,
            rx,
            cancel,
            cmd_tx,
        }
    }
}

struct Driver {
    client: Arc<dyn CaseLogClient>,
    key: SessionKey,
    tx: watch::Sender<LogSnapshot>,
    cancel: CancellationToken,
    overrides: Overrides<'static>,
    /// Locally toggled checklist ids, XOR'd with the record's submitted set.
    overlay: HashSet<String>,
    /// Cancels the previous record's media resolution when a newer record
    /// arrives.
    resolve_cancel: Option<CancellationToken>,
}

impl Driver {
    async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<SessionCmd>) {
        let cancel = self.cancel.clone();

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = self.initial_fetch() => {}
        }

        // One interval carries the poll cadence across loop iterations;
        // command traffic must not restart the period.
        let mut poll = tokio::time::interval(POLL_INTERVAL);
        poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut was_polling = false;

        loop {
            let polling = self.tx.borrow().polling;
            if polling && !was_polling {
                // Arm the timer a full period out; the record that set the
                // flag was fetched just now.
                poll.reset();
            }
            was_polling = polling;

            tokio::select! {
                _ = cancel.cancelled() => break,
                cmd = cmd_rx.recv() => match cmd {
                    Some(SessionCmd::ToggleChecklistItem(id)) => self.toggle(id),
                    None => break,
                },
                _ = poll.tick(), if polling => {
                    tracing::debug!("poll_tick");
                    self.refresh_record().await;
                }
            }
        }

        if let Some(resolve) = &self.resolve_cancel {
            resolve.cancel();
        }
        tracing::debug!("session_closed");
    }

    /// Stage T and the first Stage L fetch, concurrently. Either failure is
    /// recorded without blocking the other.
    async fn initial_fetch(&mut self) {
        let (template, record) = tokio::join!(
            self.client.fetch_template(&self.key.case_id, self.key.log_type),
            self.client.fetch_log_record(&self.key.case_id, self.key.log_type),
        );
        self.apply_template(template);
        self.apply_record(record);
    }

    async fn refresh_record(&mut self) {
        self.tx.send_modify(|s| s.record_loading = true);
        let record = self
            .client
            .fetch_log_record(&self.key.case_id, self.key.log_type)
            .await;
        self.apply_record(record);
    }

    fn apply_template(&mut self, result: Result<LogTemplate, ClientError>) {
        if self.cancel.is_cancelled() {
            tracing::debug!("stale_write_discarded");
            return;
        }
        match result {
            Ok(template) => {
                tracing::debug!(
                    checklist = template.checklist.len(),
                    fields = template.fields.len(),
                    "template_fetched"
                );
                self.tx.send_modify(|s| {
                    s.template = Some(template);
                    s.errors.template = None;
                    s.template_loading = false;
                });
            }
            Err(e) => {
                let err = StageError::TemplateFetch(e);
                tracing::warn!(error = %err, "template_fetch_failed");
                self.tx.send_modify(|s| {
                    s.template = None;
                    s.errors.record(&err);
                    s.template_loading = false;
                });
            }
        }
        self.recompute_views();
    }

    /// Apply one Stage L result. Every successful fetch counts as a new
    /// record — it supersedes the previous one's media resolution even when
    /// the payload happens to compare equal.
    fn apply_record(&mut self, result: Result<Option<LogRecord>, ClientError>) {
        // A fetch that was in flight when the session shut down is allowed
        // to complete, but its result is discarded.
        if self.cancel.is_cancelled() {
            tracing::debug!("stale_write_discarded");
            return;
        }
        match result {
            Ok(record) => {
                let was_polling = self.tx.borrow().polling;
                let polling = needs_polling(record.as_ref());
                if polling != was_polling {
                    if polling {
                        tracing::info!("poll_started");
                    } else {
                        tracing::info!("poll_stopped");
                    }
                }

                let recordings = record
                    .as_ref()
                    .map(|r| r.recordings.clone())
                    .unwrap_or_default();

                self.tx.send_modify(|s| {
                    s.record = record;
                    s.errors.log = None;
                    s.record_loading = false;
                    s.polling = polling;
                });
                self.recompute_views();
                self.trigger_resolve(recordings);
            }
            Err(e) => {
                let err = StageError::LogFetch(e);
                tracing::warn!(error = %err, "log_fetch_failed");

                // The record slice resets; so does the media derived from
                // it. Any in-flight resolution for the old record is stale.
                if let Some(resolve) = self.resolve_cancel.take() {
                    resolve.cancel();
                }
                self.tx.send_modify(|s| {
                    s.record = None;
                    s.errors.record(&err);
                    s.record_loading = false;
                    s.polling = false;
                    s.media = ResolvedMedia::default();
                });
                self.recompute_views();
            }
        }
    }

    /// Rebuild the reconciled checklist and structured rows from the
    /// current template + record. Wholesale replacement, never a patch.
    fn recompute_views(&self) {
        let overlay = &self.overlay;
        let overrides = &self.overrides;
        self.tx.send_modify(|s| {
            let (rows, checklist) = match &s.template {
                Some(template) => {
                    let notes = s
                        .record
                        .as_ref()
                        .map(|r| r.structured_notes.as_slice())
                        .unwrap_or(&[]);
                    let mut ids = s
                        .record
                        .as_ref()
                        .map(|r| r.submitted_ids())
                        .unwrap_or_default();
                    for id in overlay {
                        if !ids.remove(id) {
                            ids.insert(id.clone());
                        }
                    }
                    (
                        reconcile_notes(&template.fields, notes, overrides),
                        reconcile_checklist(&template.checklist, &ids),
                    )
                }
                None => (Vec::new(), Vec::new()),
            };
            s.structured_rows = rows;
            s.checklist = checklist;
        });
    }

    fn toggle(&mut self, id: String) {
        if !self.overlay.remove(&id) {
            self.overlay.insert(id);
        }
        self.recompute_views();
    }

    /// Stages S and X for one record's recordings. Runs detached; the child
    /// token ties its writes to this record's currency.
    fn trigger_resolve(&mut self, recordings: Vec<RecordingResource>) {
        if let Some(previous) = self.resolve_cancel.take() {
            previous.cancel();
        }
        let cancel = self.cancel.child_token();
        self.resolve_cancel = Some(cancel.clone());

        let client = self.client.clone();
        let case_id = self.key.case_id.clone();
        let tx = self.tx.clone();
        let span = tracing::Span::current();
        tokio::spawn(
            async move {
                resolve_media(client, case_id, recordings, tx, cancel).await;
            }
            .instrument(span),
        );
    }
}

struct Stale;

/// Write to the snapshot unless this resolution has been superseded. The
/// cancellation check is the staleness guard: an in-flight response is
/// allowed to complete, but its writes are discarded.
fn commit(
    tx: &watch::Sender<LogSnapshot>,
    cancel: &CancellationToken,
    f: impl FnOnce(&mut LogSnapshot),
) -> Result<(), Stale> {
    if cancel.is_cancelled() {
        tracing::debug!("stale_write_discarded");
        return Err(Stale);
    }
    tx.send_modify(f);
    Ok(())
}

/// Stage S (signed URLs) and Stage X (subtitle text) for one record.
///
/// Starts from a clean slate — all three media fields reset — then resolves
/// the playback URL and the subtitle URL/text as two independent chains;
/// either may fail without blocking the other.
async fn resolve_media(
    client: Arc<dyn CaseLogClient>,
    case_id: String,
    recordings: Vec<RecordingResource>,
    tx: watch::Sender<LogSnapshot>,
    cancel: CancellationToken,
) {
    if commit(&tx, &cancel, |s| {
        s.media = ResolvedMedia::default();
        s.errors.signed_url = None;
        s.errors.subtitle = None;
        s.resolving = true;
    })
    .is_err()
    {
        return;
    }

    let playback = async {
        let Some(key) = playback_recording(&recordings).and_then(|r| r.key.clone()) else {
            return;
        };
        let request = SignedUrlRequest {
            kind: MediaKind::Playback,
            key,
        };
        match client.resolve_signed_url(&case_id, request).await {
            Ok(Some(url)) => {
                tracing::debug!("playback_url_resolved");
                let _ = commit(&tx, &cancel, |s| s.media.playback_url = Some(url));
            }
            Ok(None) => {}
            Err(e) => {
                let err = StageError::SignedUrl(e);
                tracing::warn!(error = %err, "playback_url_failed");
                let _ = commit(&tx, &cancel, |s| s.errors.record(&err));
            }
        }
    };

    let subtitle = async {
        let Some(rec) = subtitle_recording(&recordings) else {
            return;
        };
        if rec.status() != Some(RecordingStatus::Completed) {
            return;
        }
        let Some(key) = rec.subtitle_key.clone() else {
            return;
        };

        let request = SignedUrlRequest {
            kind: MediaKind::Subtitle,
            key,
        };
        let url = match client.resolve_signed_url(&case_id, request).await {
            Ok(Some(url)) => url,
            Ok(None) => return,
            Err(e) => {
                let err = StageError::SignedUrl(e);
                tracing::warn!(error = %err, "subtitle_url_failed");
                let _ = commit(&tx, &cancel, |s| s.errors.record(&err));
                return;
            }
        };
        if commit(&tx, &cancel, |s| s.media.subtitle_url = Some(url.clone())).is_err() {
            return;
        }

        match client.fetch_proxied_text(&url).await {
            Ok(text) => {
                let trimmed = text.trim().to_string();
                tracing::debug!(bytes = trimmed.len(), "subtitle_text_fetched");
                let _ = commit(&tx, &cancel, |s| {
                    // Empty after trimming means no subtitle at all.
                    s.media.subtitle_text = (!trimmed.is_empty()).then_some(trimmed);
                });
            }
            Err(e) => {
                let err = StageError::SubtitleFetch(e);
                tracing::warn!(error = %err, "subtitle_fetch_failed");
                let _ = commit(&tx, &cancel, |s| {
                    s.media.subtitle_text = None;
                    s.errors.record(&err);
                });
            }
        }
    };

    tokio::join!(playback, subtitle);

    let _ = commit(&tx, &cancel, |s| s.resolving = false);
}
