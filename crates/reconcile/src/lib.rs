//! # Template/submission reconciliation
//!
//! A log *template* is the ordered, authoritative definition of what a call
//! or video log should contain; a *submission* is what the operator actually
//! entered. Keys on the two sides drift (casing, plurals, renames), so a
//! naive join drops rows. This crate merges the two into display-ready lists:
//!
//! - [`reconcile_notes`] — ordered label/value rows for structured notes,
//!   fuzzy-matched through `keynorm`.
//! - [`reconcile_checklist`] — template checklist entries marked done/not.
//!
//! Both are pure: output lists are rebuilt wholesale from their inputs and
//! never patched in place.

mod checklist;
mod notes;
mod types;

pub use checklist::reconcile_checklist;
pub use notes::{Overrides, reconcile_notes};
pub use types::{
    ChecklistItem, MISSING_VALUE, ReconciledRow, SubmittedAnswer, TemplateChecklistItem,
    TemplateField,
};
