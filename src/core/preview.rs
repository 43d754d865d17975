//! Search Preview Orchestrator
//!
//! Per-session state machine coordinating one live search against the remote
//! engine with the relevance matcher's synchronous output. Matching runs on
//! every keystroke without touching the network; a search runs only on
//! explicit submit.
//!
//! Submissions are tagged with a monotonically increasing ticket. An outcome
//! for anything but the newest ticket is discarded, so a slow response can
//! never overwrite the display state of a later submission (last-write-wins).

use serde::Serialize;
use tracing::debug;

use crate::core::cache::RuleSnapshot;
use crate::core::matcher::{match_overrides, match_synonyms};
use crate::core::rules::{OverrideRule, SynonymRule};
use crate::engine::SearchOutcome;

/// Rules the matcher judged relevant to the current query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RuleMatches {
    pub synonyms: Vec<SynonymRule>,
    pub overrides: Vec<OverrideRule>,
}

impl RuleMatches {
    pub fn compute(query: &str, snapshot: &RuleSnapshot) -> Self {
        Self {
            synonyms: match_synonyms(query, &snapshot.synonyms),
            overrides: match_overrides(query, &snapshot.overrides),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.synonyms.is_empty() && self.overrides.is_empty()
    }
}

/// Display phase of the preview panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum PreviewPhase {
    #[default]
    Idle,
    Searching,
    Results(SearchOutcome),
    Failed {
        error: String,
    },
}

/// Handle for one search submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket(u64);

/// Preview panel state for one connection session.
#[derive(Debug, Default)]
pub struct PreviewPanel {
    query: String,
    phase: PreviewPhase,
    matches: RuleMatches,
    newest_ticket: u64,
}

impl PreviewPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn phase(&self) -> &PreviewPhase {
        &self.phase
    }

    pub fn matches(&self) -> &RuleMatches {
        &self.matches
    }

    /// Record the typed query and recompute rule matches synchronously.
    /// Search results from a previous submission stay on display until the
    /// next submit or reset.
    pub fn update_query(&mut self, query: &str, snapshot: Option<&RuleSnapshot>) -> &RuleMatches {
        self.query = query.to_string();
        self.matches = match snapshot {
            Some(snapshot) => RuleMatches::compute(query, snapshot),
            None => RuleMatches::default(),
        };
        &self.matches
    }

    /// Begin a search for the current query. Returns `None` when the trimmed
    /// query is empty; a submission with no query is rejected locally.
    pub fn begin_search(&mut self) -> Option<SearchTicket> {
        if self.query.trim().is_empty() {
            return None;
        }
        self.newest_ticket += 1;
        self.phase = PreviewPhase::Searching;
        Some(SearchTicket(self.newest_ticket))
    }

    /// Apply a successful outcome. Returns false (and changes nothing) when
    /// a newer submission has superseded this ticket.
    pub fn apply_success(&mut self, ticket: SearchTicket, outcome: SearchOutcome) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.phase = PreviewPhase::Results(outcome);
        true
    }

    /// Apply a failure: prior hits are cleared and the message is surfaced
    /// verbatim. Stale tickets are discarded the same way as for success.
    pub fn apply_failure(&mut self, ticket: SearchTicket, error: impl Into<String>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.phase = PreviewPhase::Failed { error: error.into() };
        true
    }

    /// Collection switch: back to idle, dropping hits, matches, errors, and
    /// the typed query. Nothing from the previous collection may flash.
    pub fn reset(&mut self) {
        debug!("resetting preview panel");
        self.query.clear();
        self.phase = PreviewPhase::Idle;
        self.matches = RuleMatches::default();
        // Invalidate any in-flight submission: its ticket is now stale.
        self.newest_ticket += 1;
    }

    fn is_current(&self, ticket: SearchTicket) -> bool {
        if ticket.0 != self.newest_ticket {
            debug!(
                ticket = ticket.0,
                newest = self.newest_ticket,
                "discarding stale search outcome"
            );
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rules::{MatchKind, OverrideSpec};

    fn snapshot() -> RuleSnapshot {
        RuleSnapshot::new(
            "products",
            vec![SynonymRule {
                id: "syn-soda".to_string(),
                synonyms: vec!["soda".to_string(), "pop".to_string(), "cola".to_string()],
                root: None,
            }],
            vec![OverrideRule {
                id: "ovr-laptop".to_string(),
                rule: OverrideSpec {
                    query: "laptop".to_string(),
                    match_kind: MatchKind::Exact,
                    filter_by: None,
                },
                includes: Vec::new(),
                excludes: Vec::new(),
                filter_curated_hits: None,
                remove_matched_tokens: None,
                stop_processing: None,
            }],
        )
    }

    fn outcome(found: u64) -> SearchOutcome {
        SearchOutcome {
            found,
            search_time_ms: 3,
            echoed_query: None,
            hits: Vec::new(),
        }
    }

    #[test]
    fn keystroke_matching_needs_no_search() {
        let mut panel = PreviewPanel::new();
        let matches = panel.update_query("Cola", Some(&snapshot()));
        assert_eq!(matches.synonyms.len(), 1);
        assert!(matches.overrides.is_empty());
        assert_eq!(panel.phase(), &PreviewPhase::Idle);
    }

    #[test]
    fn blank_query_cannot_be_submitted() {
        let mut panel = PreviewPanel::new();
        panel.update_query("   ", Some(&snapshot()));
        assert!(panel.begin_search().is_none());
        assert_eq!(panel.phase(), &PreviewPhase::Idle);
    }

    #[test]
    fn submit_transitions_idle_searching_results() {
        let mut panel = PreviewPanel::new();
        panel.update_query("laptop", Some(&snapshot()));
        let ticket = panel.begin_search().unwrap();
        assert_eq!(panel.phase(), &PreviewPhase::Searching);
        assert!(panel.apply_success(ticket, outcome(5)));
        assert_eq!(panel.phase(), &PreviewPhase::Results(outcome(5)));
    }

    #[test]
    fn failure_clears_prior_hits() {
        let mut panel = PreviewPanel::new();
        panel.update_query("laptop", Some(&snapshot()));
        let first = panel.begin_search().unwrap();
        panel.apply_success(first, outcome(5));

        let second = panel.begin_search().unwrap();
        assert!(panel.apply_failure(second, "Search failed: 503"));
        assert_eq!(
            panel.phase(),
            &PreviewPhase::Failed {
                error: "Search failed: 503".to_string()
            }
        );
    }

    #[test]
    fn stale_outcome_never_overwrites_newer_submission() {
        let mut panel = PreviewPanel::new();
        panel.update_query("laptop", Some(&snapshot()));
        let old = panel.begin_search().unwrap();
        let new = panel.begin_search().unwrap();

        // The slow old response arrives after the resubmission.
        assert!(!panel.apply_success(old, outcome(1)));
        assert_eq!(panel.phase(), &PreviewPhase::Searching);

        assert!(panel.apply_success(new, outcome(2)));
        assert_eq!(panel.phase(), &PreviewPhase::Results(outcome(2)));

        // And a stale failure cannot clobber the displayed result either.
        assert!(!panel.apply_failure(old, "timed out"));
        assert_eq!(panel.phase(), &PreviewPhase::Results(outcome(2)));
    }

    #[test]
    fn reset_clears_everything_and_stales_inflight_tickets() {
        let mut panel = PreviewPanel::new();
        panel.update_query("cola", Some(&snapshot()));
        let ticket = panel.begin_search().unwrap();
        panel.apply_success(ticket, outcome(7));

        let inflight = panel.begin_search().unwrap();
        panel.reset();

        assert_eq!(panel.query(), "");
        assert_eq!(panel.phase(), &PreviewPhase::Idle);
        assert!(panel.matches().is_empty());
        // A response from before the collection switch is discarded: reset
        // advanced the ticket counter, so the in-flight ticket is stale.
        assert!(!panel.apply_success(inflight, outcome(9)));
        assert_eq!(panel.phase(), &PreviewPhase::Idle);
    }

    #[test]
    fn update_query_without_snapshot_yields_no_matches() {
        let mut panel = PreviewPanel::new();
        let matches = panel.update_query("cola", None);
        assert!(matches.is_empty());
    }
}
