use std::collections::{HashMap, HashSet};

use casedesk_keynorm::{alias_keys, normalize_raw, normalize_tokenwise};

use crate::types::{MISSING_VALUE, ReconciledRow, SubmittedAnswer, TemplateField};

/// Value produced for a field whose display value is computed rather than
/// copied verbatim from the submission (e.g. a currency-formatted amount
/// sourced from another part of the case). Receives the matched answer, if
/// any.
pub type ValueFn<'a> = Box<dyn Fn(Option<&SubmittedAnswer>) -> String + Send + Sync + 'a>;

/// Per-field display-value overrides, keyed by template field key.
#[derive(Default)]
pub struct Overrides<'a> {
    by_key: HashMap<String, ValueFn<'a>>,
}

impl<'a> Overrides<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        f: impl Fn(Option<&SubmittedAnswer>) -> String + Send + Sync + 'a,
    ) {
        self.by_key.insert(key.into(), Box::new(f));
    }

    fn get(&self, key: &str) -> Option<&ValueFn<'a>> {
        self.by_key.get(key)
    }
}

/// Index over the submitted answers: every matching vocabulary (exact key,
/// normalized keys for every alias, lower-cased label) maps to the position
/// of the **first** answer that claims it.
struct SubmissionIndex {
    exact: HashMap<String, usize>,
    tokenwise: HashMap<String, usize>,
    raw: HashMap<String, usize>,
    label: HashMap<String, usize>,
}

impl SubmissionIndex {
    fn build(submitted: &[SubmittedAnswer]) -> Self {
        let mut exact = HashMap::new();
        let mut tokenwise = HashMap::new();
        let mut raw = HashMap::new();
        let mut label = HashMap::new();

        for (i, ans) in submitted.iter().enumerate() {
            exact.entry(ans.key.clone()).or_insert(i);
            for alias in alias_keys(&ans.key) {
                tokenwise.entry(normalize_tokenwise(&alias)).or_insert(i);
                raw.entry(normalize_raw(&alias)).or_insert(i);
            }
            if let Some(l) = &ans.label {
                label.entry(l.to_lowercase()).or_insert(i);
            }
        }

        Self {
            exact,
            tokenwise,
            raw,
            label,
        }
    }

    /// Match one template field, in priority order: exact key, tokenwise
    /// key, raw key, any alias of the template key, then label text.
    /// First hit wins — ties are not scored.
    fn lookup(&self, field: &TemplateField) -> Option<usize> {
        if let Some(&i) = self.exact.get(&field.key) {
            return Some(i);
        }
        if let Some(&i) = self.tokenwise.get(&normalize_tokenwise(&field.key)) {
            return Some(i);
        }
        if let Some(&i) = self.raw.get(&normalize_raw(&field.key)) {
            return Some(i);
        }
        for alias in alias_keys(&field.key) {
            if let Some(&i) = self.exact.get(&alias) {
                return Some(i);
            }
            if let Some(&i) = self.tokenwise.get(&normalize_tokenwise(&alias)) {
                return Some(i);
            }
            if let Some(&i) = self.raw.get(&normalize_raw(&alias)) {
                return Some(i);
            }
        }
        self.label.get(&field.label.to_lowercase()).copied()
    }
}

/// All comparison forms a template side occupies, used to decide whether an
/// unmatched submission collides with a template field.
fn template_vocabulary(template: &[TemplateField]) -> HashSet<String> {
    let mut vocab = HashSet::new();
    for field in template {
        vocab.insert(field.key.clone());
        for alias in alias_keys(&field.key) {
            vocab.insert(normalize_tokenwise(&alias));
            vocab.insert(normalize_raw(&alias));
        }
    }
    vocab
}

fn collides_with_template(vocab: &HashSet<String>, ans: &SubmittedAnswer) -> bool {
    if vocab.contains(&ans.key) {
        return true;
    }
    alias_keys(&ans.key)
        .iter()
        .any(|alias| vocab.contains(&normalize_tokenwise(alias)) || vocab.contains(&normalize_raw(alias)))
}

fn display_value(ans: &SubmittedAnswer) -> String {
    match &ans.answer {
        Some(a) if !a.is_empty() => a.clone(),
        _ => MISSING_VALUE.to_string(),
    }
}

/// Merge an ordered template field list with the operator's submitted
/// answers into one ordered list of display rows.
///
/// Guarantees:
/// - one row per template field, in template order, first;
/// - unmatched submissions appended after, in their original order;
/// - every output key appears exactly once;
/// - a submission is only dropped when it duplicates a template-matched
///   field under the same normalization.
pub fn reconcile_notes(
    template: &[TemplateField],
    submitted: &[SubmittedAnswer],
    overrides: &Overrides<'_>,
) -> Vec<ReconciledRow> {
    let index = SubmissionIndex::build(submitted);
    let mut consumed: HashSet<usize> = HashSet::new();
    let mut rows = Vec::with_capacity(template.len());

    for field in template {
        let matched = index.lookup(field);
        if let Some(i) = matched {
            consumed.insert(i);
        }

        let answer = matched.map(|i| &submitted[i]);
        let value = match overrides.get(&field.key) {
            Some(f) => f(answer),
            None => answer.map(display_value).unwrap_or_else(|| MISSING_VALUE.to_string()),
        };

        rows.push(ReconciledRow {
            key: field.key.clone(),
            label: field.label.clone(),
            value,
        });
    }

    // Trailing pass: submissions the template never asked for still render,
    // unless their vocabulary collides with a template field (in which case
    // they genuinely duplicate a matched row).
    let vocab = template_vocabulary(template);
    let mut emitted_keys: HashSet<String> = rows.iter().map(|r| r.key.clone()).collect();

    for (i, ans) in submitted.iter().enumerate() {
        if consumed.contains(&i) || collides_with_template(&vocab, ans) {
            continue;
        }
        if !emitted_keys.insert(ans.key.clone()) {
            continue;
        }
        rows.push(ReconciledRow {
            key: ans.key.clone(),
            label: ans.label.clone().unwrap_or_else(|| ans.key.clone()),
            value: display_value(ans),
        });
    }

    rows
}
