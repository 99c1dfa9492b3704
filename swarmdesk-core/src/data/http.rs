//! Blocking JSON GET with retry, backoff and a circuit breaker.
//!
//! Shared by the HTTP sources. Each request carries its own timeout so price
//! and candle calls can use different budgets.

use super::circuit_breaker::CircuitBreaker;
use super::provider::DataError;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl HttpFetcher {
    pub fn new(breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("swarmdesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            breaker,
            max_retries: 2,
            base_delay: Duration::from_millis(250),
        })
    }

    pub fn with_retries(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self
    }

    pub fn is_available(&self) -> bool {
        self.breaker.is_allowed()
    }

    /// GET `url` and decode the JSON body as `T`.
    pub fn get_json<T: DeserializeOwned>(&self, url: &str, timeout: Duration) -> Result<T, DataError> {
        if !self.breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let mut last_error = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                std::thread::sleep(delay);
            }
            if !self.breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            debug!(url, attempt, "GET");
            let resp = match self
                .client
                .get(url)
                .header("Accept", "application/json")
                .timeout(timeout)
                .send()
            {
                Ok(resp) => resp,
                Err(e) if e.is_timeout() => {
                    last_error = Some(DataError::Timeout {
                        url: url.to_string(),
                        secs: timeout.as_secs(),
                    });
                    continue;
                }
                Err(e) if e.is_connect() => {
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();
            if status == StatusCode::FORBIDDEN {
                warn!(url, "403 from source, tripping circuit breaker");
                self.breaker.trip();
                return Err(DataError::CircuitBreakerTripped);
            }
            if status == StatusCode::TOO_MANY_REQUESTS {
                self.breaker.record_failure();
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                last_error = Some(DataError::RateLimited {
                    retry_after_secs: retry_after,
                });
                continue;
            }
            if status == StatusCode::BAD_REQUEST || status == StatusCode::NOT_FOUND {
                return Err(DataError::SymbolNotFound {
                    symbol: url.to_string(),
                });
            }
            if !status.is_success() {
                self.breaker.record_failure();
                last_error = Some(DataError::Other(format!("HTTP {status} from {url}")));
                continue;
            }

            let body = resp
                .text()
                .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;
            let parsed = serde_json::from_str(&body)
                .map_err(|e| DataError::MalformedResponse(format!("{url}: {e}")))?;
            self.breaker.record_success();
            return Ok(parsed);
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}
