//! Per-run outcome reporting
//!
//! A run never silently drops data: every source ends the run as
//! completed, failed (with its partial count), or disabled, and the
//! stage counters account for every record seen.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a single source ended the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceOutcome {
    /// Not configured; never contacted
    Disabled { reason: String },
    /// Completed its whole query grid
    Completed { fetched: usize },
    /// Failed part-way; raw leads fetched before the failure were kept
    Failed { reason: String, partial: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReport {
    pub source: String,
    pub outcome: SourceOutcome,
}

/// Summary of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Raw leads yielded by all sources, partial fetches included
    pub fetched: usize,
    /// Raw leads dropped for lacking any identity-bearing field
    pub skipped: usize,
    /// Distinct leads after deduplication
    pub merged: usize,
    /// Leads assigned a score
    pub scored: usize,
    /// Leads handed to the sink in the published batch
    pub published: usize,
    pub sources: Vec<SourceReport>,
    /// Whether the sink acknowledged the batch
    pub persisted: bool,
    pub sink_error: Option<String>,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            fetched: 0,
            skipped: 0,
            merged: 0,
            scored: 0,
            published: 0,
            sources: Vec::new(),
            persisted: false,
            sink_error: None,
        }
    }

    /// True when at least one source failed but the run still progressed
    pub fn partial_failure(&self) -> bool {
        self.sources
            .iter()
            .any(|s| matches!(s.outcome, SourceOutcome::Failed { .. }))
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_failure_needs_a_failed_source() {
        let mut report = RunReport::new();
        report.sources.push(SourceReport {
            source: "serpapi".to_string(),
            outcome: SourceOutcome::Disabled { reason: "no key".to_string() },
        });
        assert!(!report.partial_failure());

        report.sources.push(SourceReport {
            source: "google_places".to_string(),
            outcome: SourceOutcome::Failed { reason: "timeout".to_string(), partial: 3 },
        });
        assert!(report.partial_failure());
    }
}
