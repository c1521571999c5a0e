//! Run orchestration
//!
//! The pipeline walks one run through its states: fetch from all enabled
//! sources concurrently (each adapter independently rate limited),
//! normalize in yield order, merge duplicates, score, publish. Source
//! failures are contained per source and surface in the report; only a
//! fully failed fleet aborts the run. Cancelling the run future (for
//! example with a timeout) abandons in-flight fetches and publishes
//! nothing.

use std::cmp::Ordering;
use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use leadscout_core::{
    dedupe, Lead, RunReport, ScoreWeights, SourceOutcome, SourceReport, TrustRanking,
};
use leadscout_sources::{
    normalize, DisabledSource, LeadSource, NormalizeOptions, RawLead, SearchQuery,
};

use crate::sink::LeadSink;

/// Run-fatal errors; everything below this level is contained per source
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no sources are enabled; configure at least one API key")]
    NoSourcesEnabled,

    #[error("all {0} enabled sources failed; nothing was published")]
    AllSourcesFailed(usize),
}

/// Where a run currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Fetching,
    Normalizing,
    Merging,
    Scoring,
    Publishing,
    Done,
    Failed,
}

/// Everything one run needs, assembled once by the caller
pub struct PipelineConfig {
    pub sources: Vec<Arc<dyn LeadSource>>,
    pub disabled: Vec<DisabledSource>,
    pub queries: Vec<SearchQuery>,
    pub normalize: NormalizeOptions,
    pub trust: TrustRanking,
    pub weights: ScoreWeights,
}

/// Coordinates one collection run end to end
pub struct Pipeline {
    config: PipelineConfig,
    state: RunState,
}

/// What one source produced, partial fetches included
struct SourceFetch {
    name: &'static str,
    raws: Vec<RawLead>,
    error: Option<String>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config, state: RunState::Idle }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Execute one run against `sink`.
    ///
    /// Returns the run report on `Done`, including partial source
    /// failures and a sink failure if publishing did not persist.
    pub async fn run(&mut self, sink: &dyn LeadSink) -> Result<RunReport, PipelineError> {
        let mut report = RunReport::new();
        for d in &self.config.disabled {
            debug!("source {} disabled: {}", d.name, d.reason);
            report.sources.push(SourceReport {
                source: d.name.to_string(),
                outcome: SourceOutcome::Disabled { reason: d.reason.clone() },
            });
        }

        if self.config.sources.is_empty() {
            self.state = RunState::Failed;
            return Err(PipelineError::NoSourcesEnabled);
        }

        self.state = RunState::Fetching;
        info!(
            "run {}: fetching from {} sources over {} queries",
            report.run_id,
            self.config.sources.len(),
            self.config.queries.len()
        );
        let fetches = join_all(
            self.config
                .sources
                .iter()
                .map(|source| fetch_source(source.clone(), &self.config.queries)),
        )
        .await;

        let mut failed = 0;
        for fetch in &fetches {
            report.fetched += fetch.raws.len();
            let outcome = match &fetch.error {
                Some(reason) => {
                    failed += 1;
                    warn!("source {} failed after {} leads: {}", fetch.name, fetch.raws.len(), reason);
                    SourceOutcome::Failed { reason: reason.clone(), partial: fetch.raws.len() }
                }
                None => SourceOutcome::Completed { fetched: fetch.raws.len() },
            };
            report.sources.push(SourceReport { source: fetch.name.to_string(), outcome });
        }

        if failed == self.config.sources.len() {
            self.state = RunState::Failed;
            error!("all {failed} sources failed; aborting before merge");
            return Err(PipelineError::AllSourcesFailed(failed));
        }

        self.state = RunState::Normalizing;
        let mut leads: Vec<Lead> = Vec::new();
        for fetch in fetches {
            for raw in fetch.raws {
                match normalize(raw, &self.config.normalize) {
                    Ok(lead) => leads.push(lead),
                    Err(skip) => {
                        report.skipped += 1;
                        debug!("skipped a {} record: {}", skip.source, skip.reason);
                    }
                }
            }
        }

        self.state = RunState::Merging;
        let mut leads = dedupe(leads, &self.config.trust);
        report.merged = leads.len();

        self.state = RunState::Scoring;
        for lead in &mut leads {
            lead.score = Some(self.config.weights.score(lead));
        }
        report.scored = leads.len();
        // highest presence first in the published batch
        leads.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        self.state = RunState::Publishing;
        match sink.append_or_update(&leads).await {
            Ok(receipt) => {
                report.published = leads.len();
                report.persisted = true;
                info!("published {} leads ({} new, {} updated)", leads.len(), receipt.appended, receipt.updated);
            }
            Err(err) => {
                report.persisted = false;
                report.sink_error = Some(err.to_string());
                warn!("sink failed: {err}; run completed without persisting");
            }
        }

        self.state = RunState::Done;
        info!(
            "run {} done: {} fetched, {} skipped, {} merged, {} published",
            report.run_id, report.fetched, report.skipped, report.merged, report.published
        );
        Ok(report)
    }
}

/// Walk one source through the whole query grid, keeping partial output
async fn fetch_source(source: Arc<dyn LeadSource>, queries: &[SearchQuery]) -> SourceFetch {
    let mut raws = Vec::new();
    for query in queries {
        debug!("{}: fetching '{}'", source.name(), query.text());
        if let Err(err) = source.fetch(query, &mut raws).await {
            return SourceFetch {
                name: source.name(),
                raws,
                error: Some(err.to_string()),
            };
        }
    }
    SourceFetch { name: source.name(), raws, error: None }
}
