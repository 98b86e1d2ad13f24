use std::future::Future;

use http::StatusCode;
use tokio::time::{sleep, timeout, Duration};
use tracing::{error, warn};

use crate::config::settings::RetryConfig;
use crate::error::{is_retryable_status, TokenError};
use crate::observability::metrics::get_metrics;

/// Anything an attempt can hand back that carries an HTTP status.
pub trait AttemptStatus {
    fn status(&self) -> StatusCode;
}

/// Fixed-delay retry budget for one token exchange.
#[derive(Debug, Clone)]
pub struct RetrySettings {
    pub attempts: u32,
    pub attempt_timeout: Duration,
    pub delay: Duration,
}

impl From<&RetryConfig> for RetrySettings {
    fn from(cfg: &RetryConfig) -> Self {
        Self {
            attempts: cfg.attempts(),
            attempt_timeout: cfg.attempt_timeout(),
            delay: cfg.delay(),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl RetrySettings {
    /// Run `operation` until it yields a non-retryable response.
    ///
    /// * an attempt exceeding `attempt_timeout` is retried
    /// * any other transport error is returned at once
    /// * 500, 429 and 502 are retried, every other status is returned as is
    ///   for the caller to interpret
    ///
    /// Each retry sleeps `delay` first. Once the budget is spent the call
    /// fails with the retry-limit-exceeded internal error.
    pub async fn run_with_retry<F, Fut, R>(&self, mut operation: F) -> Result<R, TokenError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R, reqwest::Error>>,
        R: AttemptStatus,
    {
        let metrics = get_metrics().await;
        let mut retries = self.attempts;

        loop {
            if retries == 0 {
                error!("all {} attempts failed, retry limit exceeded", self.attempts);
                return Err(TokenError::retry_limit_exceeded());
            }

            metrics.exchange_attempts.inc();
            // dropping the timed-out future releases the attempt and its timer
            match timeout(self.attempt_timeout, operation()).await {
                Err(_) => {
                    warn!(timeout = ?self.attempt_timeout, "token request attempt timed out");
                }
                Ok(Err(e)) => return Err(TokenError::Transport(e)),
                Ok(Ok(response)) => {
                    let status = response.status();
                    if !is_retryable_status(status) {
                        return Ok(response);
                    }
                    warn!(status = status.as_u16(), "identity service returned a retryable status");
                }
            }

            retries = self.sleep_and_decrement(retries).await;
        }
    }

    async fn sleep_and_decrement(&self, retries: u32) -> u32 {
        warn!("Retrying request, retries left: {}", retries);
        get_metrics().await.exchange_retries.inc();
        sleep(self.delay).await;
        retries - 1
    }
}
