use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::token::Token;
use crate::config::credentials::CredentialConfig;
use crate::config::settings::SettingsConfig;
use crate::error::TokenError;
use crate::observability::metrics::get_metrics;
use crate::sources::identity::IdentityClient;

/// A token or the reason there is none.
pub type TokenResult = Result<String, TokenError>;

type ResultSlot = oneshot::Sender<TokenResult>;

/// Consumer side of the result channel.
///
/// Every `recv` is one rendezvous with the refresh loop: the loop evaluates
/// the cache only once a consumer is waiting, so a result is never computed
/// ahead of demand and never goes stale in a buffer.
#[derive(Debug)]
pub struct ResultChannel {
    requests: mpsc::Sender<ResultSlot>,
}

impl ResultChannel {
    /// Wait for the next result. `None` once the loop has stopped.
    pub async fn recv(&self) -> Option<TokenResult> {
        let (slot, result) = oneshot::channel();
        self.requests.send(slot).await.ok()?;
        result.await.ok()
    }

    pub fn is_closed(&self) -> bool {
        self.requests.is_closed()
    }

    /// Resolves once the refresh loop has ended.
    pub async fn closed(&self) {
        self.requests.closed().await
    }
}

/// Out-of-band stop signal for the refresh loop.
#[derive(Debug, Clone)]
pub struct ExitChannel {
    signal: CancellationToken,
}

impl ExitChannel {
    /// Best-effort and non-blocking; signalling a stopped loop is a no-op.
    pub fn signal(&self) {
        self.signal.cancel();
    }

    pub fn is_signalled(&self) -> bool {
        self.signal.is_cancelled()
    }
}

/// The channel pair a consumer uses to talk to one refresh loop.
#[derive(Debug)]
pub struct TokenChannels {
    pub results: ResultChannel,
    pub exit: ExitChannel,
}

impl TokenChannels {
    /// True once the loop has stopped or has been told to stop.
    pub fn is_closed(&self) -> bool {
        self.exit.is_signalled() || self.results.is_closed()
    }
}

/// Owns one credential lineage and hands out refresh loops for it.
///
/// Each loop is the only reader and writer of its cached token. A loop
/// serves one logical consumer at a time; callers that share it are served
/// strictly one after another.
#[derive(Debug, Clone)]
pub struct TokenHandler {
    inner: Arc<HandlerInner>,
}

#[derive(Debug)]
struct HandlerInner {
    credentials: CredentialConfig,
    client: IdentityClient,
    guard_window: Duration,
}

impl TokenHandler {
    pub fn new(credentials: CredentialConfig, settings: &SettingsConfig) -> Result<Self, TokenError> {
        let client = IdentityClient::new(credentials.iam_insecure, settings)?;
        Ok(Self::with_client(credentials, client, settings.guard_window()))
    }

    pub fn with_client(credentials: CredentialConfig, client: IdentityClient, guard_window: Duration) -> Self {
        Self {
            inner: Arc::new(HandlerInner {
                credentials,
                client,
                guard_window,
            }),
        }
    }

    pub fn credentials(&self) -> &CredentialConfig {
        &self.inner.credentials
    }

    /// Spawn a refresh loop and return the channels that drive it.
    ///
    /// Must be called from within a tokio runtime. The loop stops when the
    /// exit signal fires or when the returned channels are dropped.
    pub fn token_channels(&self) -> TokenChannels {
        let (requests_tx, requests_rx) = mpsc::channel(1);
        let exit = CancellationToken::new();

        let refresh_loop = RefreshLoop {
            inner: self.inner.clone(),
            cached: None,
        };
        tokio::spawn(refresh_loop.run(requests_rx, exit.clone()));

        TokenChannels {
            results: ResultChannel { requests: requests_tx },
            exit: ExitChannel { signal: exit },
        }
    }
}

struct RefreshLoop {
    inner: Arc<HandlerInner>,
    cached: Option<Token>,
}

impl RefreshLoop {
    async fn run(mut self, mut requests: mpsc::Receiver<ResultSlot>, exit: CancellationToken) {
        info!(client_id = %self.inner.credentials.client_id, "token handler started");
        loop {
            let slot = tokio::select! {
                biased;
                _ = exit.cancelled() => break,
                request = requests.recv() => match request {
                    Some(slot) => slot,
                    None => break,
                },
            };

            let result = tokio::select! {
                biased;
                _ = exit.cancelled() => break,
                result = self.current_token() => result,
            };

            if slot.send(result).is_err() {
                debug!("token consumer left before the result was delivered");
            }
        }
        info!(client_id = %self.inner.credentials.client_id, "token handler stopped");
    }

    /// Cached token when it is outside the guard window, a fresh one otherwise.
    async fn current_token(&mut self) -> TokenResult {
        let metrics = get_metrics().await;
        let guard_window = self.inner.guard_window;

        if let Some(token) = self.cached.as_ref().filter(|t| !t.needs_refresh(guard_window)) {
            metrics.token_cache_hits.inc();
            debug!(expires_at = ?token.expiry, "serving cached token");
            return Ok(token.value.clone());
        }

        let token = self
            .inner
            .client
            .generate_token(&self.inner.credentials)
            .await
            .inspect_err(|e| warn!(error = %e, "token refresh failed"))?;

        metrics.token_refreshes.inc();
        if let Some(exp) = token.exp_unix_ts() {
            metrics.token_expiry_unix.set(exp);
        }
        info!(expires_at = ?token.expiry, "token refreshed");

        let value = token.value.clone();
        self.cached = Some(token);
        Ok(value)
    }
}
