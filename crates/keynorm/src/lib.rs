//! # Canonical key normalization
//!
//! Template fields and operator-entered answer keys drift apart in predictable
//! ways: casing, punctuation, pluralization, and a handful of historical
//! renames. This crate turns both sides into canonical comparison keys so the
//! reconciler can match them without a fuzzy-matching library. The business
//! vocabulary is small and closed; precision matters more than recall, so the
//! alias rules are an explicit table rather than a similarity metric.
//!
//! Everything here is pure and deterministic.

use std::collections::BTreeSet;

/// Lower-case, trim, collapse every run of non-alphanumeric characters to a
/// single `_`, and strip leading/trailing underscores.
///
/// `"Requested Loan Amount "` → `"requested_loan_amount"`,
/// `"defaults__"` → `"defaults"`.
pub fn normalize_raw(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_sep = false;

    for ch in s.to_lowercase().chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(ch);
        } else {
            pending_sep = true;
        }
    }

    out
}

/// [`normalize_raw`], then singularize each `_`-delimited token.
///
/// Per token: strip a trailing `"es"` when the token is longer than 2 chars,
/// otherwise a trailing `"s"` when longer than 1. Applied token-by-token, not
/// to the whole string, so `"late_payments"` → `"late_payment"` while the
/// `"late"` token is untouched.
pub fn normalize_tokenwise(s: &str) -> String {
    normalize_raw(s)
        .split('_')
        .map(singularize)
        .collect::<Vec<_>>()
        .join("_")
}

fn singularize(token: &str) -> &str {
    if token.len() > 2 && token.ends_with("es") {
        &token[..token.len() - 2]
    } else if token.len() > 1 && token.ends_with('s') {
        &token[..token.len() - 1]
    } else {
        token
    }
}

/// One alias rule: maps a key to an alternate spelling, or `None` when the
/// rule does not apply.
type AliasRule = fn(&str) -> Option<String>;

/// The closed rule table. Each rule covers one naming drift observed in
/// production templates; both directions of a rename are separate entries so
/// either side's vocabulary can be the stale one.
const ALIAS_RULES: &[AliasRule] = &[
    defaults_to_default,
    default_to_defaults,
    late_payment_to_plural,
    late_payments_to_singular,
];

fn defaults_to_default(key: &str) -> Option<String> {
    key.strip_prefix("defaults_")
        .map(|rest| format!("default_{rest}"))
}

fn default_to_defaults(key: &str) -> Option<String> {
    if key.starts_with("defaults_") {
        return None;
    }
    key.strip_prefix("default_")
        .map(|rest| format!("defaults_{rest}"))
}

fn late_payment_to_plural(key: &str) -> Option<String> {
    if key.ends_with("_late_payment") {
        Some(format!("{key}s"))
    } else {
        None
    }
}

fn late_payments_to_singular(key: &str) -> Option<String> {
    key.strip_suffix("_late_payments")
        .map(|stem| format!("{stem}_late_payment"))
}

/// Expand a key into its closed set of known aliases.
///
/// Always contains the input key itself. The set is ordered (`BTreeSet`) so
/// iteration order — and therefore first-match-wins reconciliation — is
/// deterministic.
pub fn alias_keys(key: &str) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    out.insert(key.to_string());
    for rule in ALIAS_RULES {
        if let Some(alias) = rule(key) {
            out.insert(alias);
        }
    }
    out
}
