/// Sentinel rendered when a template field has no matching submission.
pub const MISSING_VALUE: &str = "-";

/// One field the template expects an answer for. Ordering of the template
/// list is authoritative for display.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TemplateField {
    pub key: String,
    pub label: String,
}

/// One answer the operator actually filled in. `key` is free text and may
/// not exactly match any template key (synonyms, plurals, trailing
/// underscores).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SubmittedAnswer {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

/// One display row of the reconciled structured notes. Produced fresh on
/// every reconciliation; never mutated.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ReconciledRow {
    pub key: String,
    pub label: String,
    pub value: String,
}

/// One checklist entry from the template. Immutable; `order` is authoritative
/// for display.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TemplateChecklistItem {
    pub question_id: String,
    pub text: String,
    pub order: i64,
}

/// Display form of a checklist entry. `done` is derived from the submitted
/// id set, never stored.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub text: String,
    pub done: bool,
}
