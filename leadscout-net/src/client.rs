//! HTTP client construction and bounded retry

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::warn;

/// HTTP settings shared by all source adapters
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Retries after the first attempt of a request
    pub max_retries: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

/// Errors from HTTP transport
#[derive(Debug, Error)]
pub enum NetError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server returned status {0}")]
    Status(StatusCode),
}

/// User agent reported to upstream APIs
pub const USER_AGENT: &str = "leadscout/0.1";

/// Create an HTTP client for API calls
pub fn create_client(config: &HttpConfig) -> Result<Client, NetError> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| NetError::ClientBuild(e.to_string()))
}

/// Run `op`, retrying transient failures with exponential backoff.
///
/// Transient means connect errors, timeouts, HTTP 429 and 5xx. Backoff
/// starts at one second and doubles up to ten, with jitter.
pub async fn with_retry<T, F, Fut>(max_retries: u32, mut op: F) -> Result<T, NetError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, NetError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_retries && is_transient(&err) => {
                attempt += 1;
                let delay = backoff_delay(attempt);
                warn!("transient failure (attempt {attempt}): {err}; retrying in {delay:?}");
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

fn is_transient(err: &NetError) -> bool {
    match err {
        NetError::Request(e) => e.is_timeout() || e.is_connect(),
        NetError::Status(code) => {
            code.is_server_error() || *code == StatusCode::TOO_MANY_REQUESTS
        }
        NetError::ClientBuild(_) => false,
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    let base_secs = (1u64 << (attempt - 1).min(4)).min(10);
    let jitter_ms = rand::thread_rng().gen_range(0..250);
    Duration::from_millis(base_secs * 1000 + jitter_ms)
}
