//! Leadscout CLI
//!
//! Collects business leads from every configured source, scores their
//! digital presence and publishes one deduplicated batch per run.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use leadscout_core::{RunReport, ScoreWeights, SourceOutcome, TrustRanking};
use leadscout_net::HttpConfig;
use leadscout_runtime::{JsonlTableSink, Pipeline, PipelineConfig};
use leadscout_sources::{build_sources, NormalizeOptions, SearchQuery, SourceConfig};

#[derive(Parser)]
#[command(name = "leadscout")]
#[command(author, version, about = "Multi-source business lead collection and scoring", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1")]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect, score and publish leads
    Run {
        #[command(flatten)]
        sources: SourceArgs,

        /// Comma-separated niches to search
        #[arg(long, env = "NICHES", value_delimiter = ',', required = true)]
        niches: Vec<String>,

        /// Comma-separated cities to search
        #[arg(long, env = "CITIES", value_delimiter = ',', required = true)]
        cities: Vec<String>,

        /// Destination lead table (JSONL file)
        #[arg(long, env = "SINK_TARGET")]
        sink: PathBuf,

        /// Trust ranking for merge conflicts, most trusted first
        #[arg(long, value_delimiter = ',')]
        trust: Option<Vec<String>>,

        /// Country calling code stripped from phone numbers
        #[arg(long, env = "PHONE_COUNTRY_PREFIX")]
        country_prefix: Option<String>,

        /// Cancel the whole run after this many seconds; nothing is
        /// published from a cancelled run
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Show which sources the current configuration enables
    Sources {
        #[command(flatten)]
        sources: SourceArgs,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Google Places API key
    #[arg(long, env = "GOOGLE_PLACES_API_KEY", hide_env_values = true)]
    google_places_key: Option<String>,

    /// SerpAPI key
    #[arg(long, env = "SERPAPI_KEY", hide_env_values = true)]
    serpapi_key: Option<String>,

    /// Requests per second allowed per source (0 disables throttling)
    #[arg(long, env = "RATE_LIMIT_PER_SECOND", default_value = "4")]
    rate_limit: f64,
}

impl SourceArgs {
    fn to_config(&self) -> SourceConfig {
        SourceConfig {
            google_places_key: self.google_places_key.clone(),
            serpapi_key: self.serpapi_key.clone(),
            rate_limit_per_second: self.rate_limit,
            http: HttpConfig::default(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    match cli.command {
        Commands::Run { sources, niches, cities, sink, trust, country_prefix, timeout } => {
            run_collection(sources, niches, cities, sink, trust, country_prefix, timeout).await?;
        }
        Commands::Sources { sources } => {
            show_sources(sources)?;
        }
    }

    Ok(())
}

async fn run_collection(
    sources: SourceArgs,
    niches: Vec<String>,
    cities: Vec<String>,
    sink_target: PathBuf,
    trust: Option<Vec<String>>,
    country_prefix: Option<String>,
    timeout: Option<u64>,
) -> Result<()> {
    let plan = build_sources(&sources.to_config())?;
    for disabled in &plan.disabled {
        println!("⏭️  {} disabled: {}", disabled.name, disabled.reason);
    }

    let queries = query_grid(&niches, &cities);
    println!(
        "🚀 Starting collection: {} sources, {} queries -> {}\n",
        plan.enabled.len(),
        queries.len(),
        sink_target.display()
    );

    let config = PipelineConfig {
        sources: plan.enabled,
        disabled: plan.disabled,
        queries,
        normalize: NormalizeOptions { strip_country_prefix: country_prefix },
        trust: trust.map(TrustRanking::new).unwrap_or_default(),
        weights: ScoreWeights::default(),
    };

    let sink = JsonlTableSink::new(sink_target);
    let mut pipeline = Pipeline::new(config);

    let report = match timeout {
        Some(secs) => {
            match tokio::time::timeout(Duration::from_secs(secs), pipeline.run(&sink)).await {
                Ok(result) => result?,
                Err(_) => anyhow::bail!("run cancelled after {secs}s; nothing was published"),
            }
        }
        None => pipeline.run(&sink).await?,
    };

    print_report(&report);
    Ok(())
}

fn show_sources(sources: SourceArgs) -> Result<()> {
    let plan = build_sources(&sources.to_config())?;

    for source in &plan.enabled {
        println!("✅ {} (rate limit: {}/s)", source.name(), sources.rate_limit);
    }
    for disabled in &plan.disabled {
        println!("⏭️  {} disabled: {}", disabled.name, disabled.reason);
    }
    if plan.enabled.is_empty() {
        println!("\n⚠️  No sources enabled. Set GOOGLE_PLACES_API_KEY and/or SERPAPI_KEY.");
    }
    Ok(())
}

/// Cross product of niches and cities, one query per pair
fn query_grid(niches: &[String], cities: &[String]) -> Vec<SearchQuery> {
    cities
        .iter()
        .flat_map(|city| niches.iter().map(|niche| SearchQuery::new(niche.clone(), city.clone())))
        .collect()
}

fn print_report(report: &RunReport) {
    println!("\n📊 Run {} summary", report.run_id);
    println!(
        "   fetched: {} | skipped: {} | merged: {} | scored: {} | published: {}",
        report.fetched, report.skipped, report.merged, report.scored, report.published
    );

    for source in &report.sources {
        match &source.outcome {
            SourceOutcome::Completed { fetched } => {
                println!("   ✅ {}: {} raw leads", source.source, fetched);
            }
            SourceOutcome::Failed { reason, partial } => {
                println!("   ⚠️  {}: failed ({reason}); kept {partial} partial leads", source.source);
            }
            SourceOutcome::Disabled { reason } => {
                println!("   ⏭️  {}: disabled ({reason})", source.source);
            }
        }
    }

    if report.persisted {
        println!("\n✅ Batch persisted.");
    } else if let Some(error) = &report.sink_error {
        println!("\n⚠️  Batch NOT persisted: {error}");
    }
    if report.partial_failure() {
        println!("⚠️  Some sources failed; coverage is partial.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_grid_is_the_cross_product() {
        let grid = query_grid(
            &["dentist".to_string(), "florist".to_string()],
            &["Springfield".to_string()],
        );
        assert_eq!(grid.len(), 2);
        assert_eq!(grid[0], SearchQuery::new("dentist", "Springfield"));
        assert_eq!(grid[1], SearchQuery::new("florist", "Springfield"));
    }
}
