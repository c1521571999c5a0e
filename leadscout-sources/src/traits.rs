//! Common source adapter contract

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use leadscout_net::{with_retry, NetError, RateLimiter};

use crate::raw::RawLead;

/// Errors from one source adapter, contained per source
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(#[from] NetError),

    #[error("malformed response: {0}")]
    Parse(String),

    #[error("authentication rejected: {0}")]
    Auth(String),
}

/// One cell of a run's query grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub niche: String,
    pub city: String,
}

impl SearchQuery {
    pub fn new(niche: impl Into<String>, city: impl Into<String>) -> Self {
        Self { niche: niche.into(), city: city.into() }
    }

    /// Free-text rendering for search-engine style sources
    pub fn text(&self) -> String {
        format!("{} in {}", self.niche, self.city)
    }
}

/// Uniform fetch capability over one external data source
#[async_trait]
pub trait LeadSource: Send + Sync {
    /// Stable source tag recorded on every lead this adapter yields
    fn name(&self) -> &'static str;

    /// Fetch raw leads for one query, pushing into `out` as they arrive.
    ///
    /// Each invocation starts fresh; the sequence is finite and not
    /// restartable mid-run. Raw leads pushed before an error are kept by
    /// the caller - the error only marks where the sequence stopped.
    async fn fetch(&self, query: &SearchQuery, out: &mut Vec<RawLead>) -> Result<(), SourceError>;
}

/// Rate-limited, retrying HTTP access for one source
#[derive(Clone)]
pub struct SourceHttp {
    client: Client,
    limiter: Arc<RateLimiter>,
    max_retries: u32,
}

impl SourceHttp {
    pub fn new(client: Client, limiter: Arc<RateLimiter>, max_retries: u32) -> Self {
        Self { client, limiter, max_retries }
    }

    /// GET a JSON document. Every attempt, retries included, first waits
    /// on the source's rate limiter.
    pub async fn get_json<T>(&self, url: &str, params: &[(&str, &str)]) -> Result<T, SourceError>
    where
        T: DeserializeOwned,
    {
        let result = with_retry(self.max_retries, || async move {
            self.limiter.acquire().await;
            let response = self.client.get(url).query(params).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(NetError::Status(status));
            }
            Ok(response.json::<T>().await?)
        })
        .await;

        match result {
            Err(NetError::Status(code))
                if code == StatusCode::UNAUTHORIZED || code == StatusCode::FORBIDDEN =>
            {
                Err(SourceError::Auth(format!("status {code}")))
            }
            other => Ok(other?),
        }
    }
}
