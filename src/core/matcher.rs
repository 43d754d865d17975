//! Relevance Matcher
//!
//! Pure query-to-rule matching for the search preview panel. Given the raw
//! text a user has typed, decide which synonym and override rules would
//! plausibly affect that query's results so the UI can explain *why* a search
//! behaves the way it does.
//!
//! The synonym check is a symmetric case-insensitive substring test: a rule
//! matches when any of its terms appears inside the query or the query
//! appears inside a term. No punctuation, diacritic, or plural normalization
//! is performed; that is a documented limitation of the heuristic, not a bug.
//!
//! Both functions are deterministic, perform no I/O, and cannot fail. They
//! are cheap enough to run on every keystroke.

use super::rules::{MatchKind, OverrideRule, SynonymRule};

/// Return every synonym rule whose terms overlap the query.
///
/// Candidate terms for a directional rule are its synonyms plus the root;
/// for a symmetric rule, the synonyms alone. Empty terms are skipped — a
/// vacuous substring match would flag every rule for every query. The result
/// preserves input order (stable filter).
pub fn match_synonyms(query: &str, rules: &[SynonymRule]) -> Vec<SynonymRule> {
    let query = query.to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    rules
        .iter()
        .filter(|rule| {
            rule.candidate_terms()
                .any(|term| terms_overlap(&query, term))
        })
        .cloned()
        .collect()
}

/// Return every override rule whose trigger pattern matches the query.
///
/// `exact` requires case-insensitive equality; `contains` requires the query
/// to contain the pattern (query-contains-pattern — the direction is
/// asymmetric, unlike the synonym check). Unrecognized match kinds and empty
/// patterns match nothing. The result preserves input order.
pub fn match_overrides(query: &str, rules: &[OverrideRule]) -> Vec<OverrideRule> {
    let query = query.to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    rules
        .iter()
        .filter(|rule| {
            let pattern = rule.rule.query.to_lowercase();
            if pattern.is_empty() {
                return false;
            }
            match rule.rule.match_kind {
                MatchKind::Exact => query == pattern,
                MatchKind::Contains => query.contains(&pattern),
                MatchKind::Unknown => false,
            }
        })
        .cloned()
        .collect()
}

/// Symmetric substring test between the lowercased query and one rule term.
fn terms_overlap(query: &str, term: &str) -> bool {
    let term = term.to_lowercase();
    if term.is_empty() {
        return false;
    }
    query.contains(&term) || term.contains(query)
}
