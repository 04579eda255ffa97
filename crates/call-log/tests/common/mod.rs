use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use call_log::{
    BoxFuture, CaseLogClient, ClientError, LogRecord, LogTemplate, LogType, RecordingResource,
    SignedUrlRequest, SubmittedQuestion,
};
use casedesk_reconcile::{SubmittedAnswer, TemplateChecklistItem, TemplateField};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

// ── Fixtures ────────────────────────────────────────────────────────────────

pub fn template() -> LogTemplate {
    LogTemplate {
        checklist: vec![
            TemplateChecklistItem {
                question_id: "q1".into(),
                text: "Verify applicant identity".into(),
                order: 1,
            },
            TemplateChecklistItem {
                question_id: "q2".into(),
                text: "Confirm income statement".into(),
                order: 2,
            },
        ],
        fields: vec![TemplateField {
            key: "requested_loan_amount".into(),
            label: "Requested loan amount".into(),
        }],
    }
}

pub fn record_with_status(status: &str) -> LogRecord {
    LogRecord {
        checklist: vec![SubmittedQuestion {
            question_id: "q1".into(),
        }],
        structured_notes: vec![SubmittedAnswer {
            key: "Requested Loan Amounts".into(),
            label: None,
            answer: Some("75000".into()),
        }],
        recordings: vec![RecordingResource {
            key: Some("rec-1".into()),
            subtitle_key: Some("sub-1".into()),
            status: Some(status.into()),
        }],
    }
}

pub const SUBTITLE_PAYLOAD: &str =
    "  1\n00:00:01,000 --> 00:00:02,000\nHello\n\n2\n00:00:05,000 --> 00:00:06,500\nWorld  ";

// ── Mock collaborator ───────────────────────────────────────────────────────

/// Scripted host service layer. Record fetches pop a queue (the last entry
/// repeats); counters expose how often each endpoint was hit.
pub struct MockClient {
    template: Mutex<Result<LogTemplate, String>>,
    records: Mutex<VecDeque<Result<Option<LogRecord>, String>>>,
    subtitle_text: Mutex<Result<String, String>>,
    record_delay: Mutex<Option<Duration>>,
    resolve_delay: Mutex<Option<Duration>>,
    pub record_fetches: AtomicUsize,
    pub url_resolutions: AtomicUsize,
}

impl MockClient {
    pub fn new(records: Vec<Result<Option<LogRecord>, String>>) -> Self {
        Self {
            template: Mutex::new(Ok(template())),
            records: Mutex::new(records.into()),
            subtitle_text: Mutex::new(Ok(SUBTITLE_PAYLOAD.to_string())),
            record_delay: Mutex::new(None),
            resolve_delay: Mutex::new(None),
            record_fetches: AtomicUsize::new(0),
            url_resolutions: AtomicUsize::new(0),
        }
    }

    pub fn with_template_error(self, message: &str) -> Self {
        *self.template.lock().unwrap() = Err(message.to_string());
        self
    }

    pub fn with_subtitle_error(self, message: &str) -> Self {
        *self.subtitle_text.lock().unwrap() = Err(message.to_string());
        self
    }

    pub fn with_record_delay(self, delay: Duration) -> Self {
        *self.record_delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn with_resolve_delay(self, delay: Duration) -> Self {
        *self.resolve_delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn record_fetch_count(&self) -> usize {
        self.record_fetches.load(Ordering::SeqCst)
    }
}

impl CaseLogClient for MockClient {
    fn fetch_template<'a>(
        &'a self,
        _case_id: &'a str,
        _log_type: LogType,
    ) -> BoxFuture<'a, Result<LogTemplate, ClientError>> {
        Box::pin(async move {
            self.template
                .lock()
                .unwrap()
                .clone()
                .map_err(ClientError::from)
        })
    }

    fn fetch_log_record<'a>(
        &'a self,
        _case_id: &'a str,
        _log_type: LogType,
    ) -> BoxFuture<'a, Result<Option<LogRecord>, ClientError>> {
        Box::pin(async move {
            let delay = *self.record_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.record_fetches.fetch_add(1, Ordering::SeqCst);
            let mut queue = self.records.lock().unwrap();
            let next = if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            };
            next.unwrap_or(Ok(None)).map_err(ClientError::from)
        })
    }

    fn resolve_signed_url<'a>(
        &'a self,
        _case_id: &'a str,
        request: SignedUrlRequest,
    ) -> BoxFuture<'a, Result<Option<String>, ClientError>> {
        Box::pin(async move {
            let delay = *self.resolve_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.url_resolutions.fetch_add(1, Ordering::SeqCst);
            Ok(Some(format!(
                "https://signed.example/{}/{}",
                request.kind.as_str(),
                request.key
            )))
        })
    }

    fn fetch_proxied_text<'a>(
        &'a self,
        _url: &'a str,
    ) -> BoxFuture<'a, Result<String, ClientError>> {
        Box::pin(async move {
            self.subtitle_text
                .lock()
                .unwrap()
                .clone()
                .map_err(ClientError::from)
        })
    }
}
