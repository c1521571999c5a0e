//! Source construction from configuration
//!
//! A source with no API key is disabled up front: it never builds an
//! HTTP client and never issues a request. Disabled is an expected
//! state, reported separately from failure.

use std::sync::Arc;

use tracing::info;

use leadscout_net::{create_client, HttpConfig, LimiterRegistry, NetError};

use crate::places::{PlacesSource, PLACES_TAG};
use crate::serp::{SerpApiSource, SERPAPI_TAG};
use crate::traits::{LeadSource, SourceHttp};

/// API keys and throughput settings for every known source
#[derive(Debug, Clone, Default)]
pub struct SourceConfig {
    pub google_places_key: Option<String>,
    pub serpapi_key: Option<String>,
    /// Requests per second allowed per source; `0.0` disables throttling
    pub rate_limit_per_second: f64,
    pub http: HttpConfig,
}

impl SourceConfig {
    fn key(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

/// A source that will sit the run out, and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisabledSource {
    pub name: &'static str,
    pub reason: String,
}

/// The adapters a run fans out to, plus the ones sitting out
pub struct SourcePlan {
    pub enabled: Vec<Arc<dyn LeadSource>>,
    pub disabled: Vec<DisabledSource>,
}

/// Build the adapter set for one run's configuration.
pub fn build_sources(config: &SourceConfig) -> Result<SourcePlan, NetError> {
    let limiters = LimiterRegistry::default();
    let mut enabled: Vec<Arc<dyn LeadSource>> = Vec::new();
    let mut disabled = Vec::new();

    match SourceConfig::key(&config.google_places_key) {
        Some(key) => {
            let http = SourceHttp::new(
                create_client(&config.http)?,
                limiters.for_source(PLACES_TAG, config.rate_limit_per_second),
                config.http.max_retries,
            );
            enabled.push(Arc::new(PlacesSource::new(key.to_string(), http)));
        }
        None => disabled.push(DisabledSource {
            name: PLACES_TAG,
            reason: "GOOGLE_PLACES_API_KEY not set".to_string(),
        }),
    }

    match SourceConfig::key(&config.serpapi_key) {
        Some(key) => {
            let http = SourceHttp::new(
                create_client(&config.http)?,
                limiters.for_source(SERPAPI_TAG, config.rate_limit_per_second),
                config.http.max_retries,
            );
            enabled.push(Arc::new(SerpApiSource::new(key.to_string(), http)));
        }
        None => disabled.push(DisabledSource {
            name: SERPAPI_TAG,
            reason: "SERPAPI_KEY not set".to_string(),
        }),
    }

    info!("{} sources enabled, {} disabled", enabled.len(), disabled.len());
    Ok(SourcePlan { enabled, disabled })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyless_sources_are_disabled_not_built() {
        let plan = build_sources(&SourceConfig::default()).unwrap();
        assert!(plan.enabled.is_empty());
        assert_eq!(plan.disabled.len(), 2);
        assert!(plan.disabled.iter().any(|d| d.name == PLACES_TAG));
        assert!(plan.disabled.iter().any(|d| d.name == SERPAPI_TAG));
    }

    #[test]
    fn blank_keys_count_as_missing() {
        let config = SourceConfig {
            google_places_key: Some("   ".to_string()),
            serpapi_key: Some(String::new()),
            ..SourceConfig::default()
        };
        let plan = build_sources(&config).unwrap();
        assert!(plan.enabled.is_empty());
        assert_eq!(plan.disabled.len(), 2);
    }

    #[test]
    fn configured_sources_are_enabled() {
        let config = SourceConfig {
            google_places_key: Some("places-key".to_string()),
            serpapi_key: Some("serp-key".to_string()),
            rate_limit_per_second: 4.0,
            ..SourceConfig::default()
        };
        let plan = build_sources(&config).unwrap();
        assert_eq!(plan.enabled.len(), 2);
        assert!(plan.disabled.is_empty());
        let names: Vec<_> = plan.enabled.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec![PLACES_TAG, SERPAPI_TAG]);
    }
}
