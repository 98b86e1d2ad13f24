use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::credentials::CredentialConfig;
use crate::config::settings::SettingsConfig;
use crate::error::TokenError;
use crate::handler::context::Context;
use crate::handler::handler::{TokenChannels, TokenHandler};

/// Call-style token retrieval, the shape handed to business logic under
/// [`TOKEN_RETRIEVE_FUNC_KEY`](crate::utils::constants::TOKEN_RETRIEVE_FUNC_KEY).
pub type RetrieveTokenFn = Arc<dyn Fn(Context) -> RetrieveFuture + Send + Sync>;

pub type RetrieveFuture = Pin<Box<dyn Future<Output = Result<String, TokenError>> + Send>>;

/// Turns the handler's channel pair into a single cancellable call.
pub struct TokenRetriever {
    handler: TokenHandler,
    channels: Mutex<TokenChannels>,
}

impl TokenRetriever {
    /// Starts the handler's refresh loop; needs a tokio runtime.
    pub fn new(handler: TokenHandler) -> Self {
        let channels = handler.token_channels();
        Self {
            handler,
            channels: Mutex::new(channels),
        }
    }

    pub fn from_config(credentials: CredentialConfig, settings: &SettingsConfig) -> Result<Self, TokenError> {
        Ok(Self::new(TokenHandler::new(credentials, settings)?))
    }

    /// Wait for the next token, or for `ctx` to be done.
    ///
    /// When `ctx` wins, the refresh loop is told to exit and the call fails
    /// with `Cancelled` or `DeadlineExceeded`. The next call starts a new
    /// loop, so one cancelled request never disables the retriever.
    pub async fn retrieve(&self, ctx: &Context) -> Result<String, TokenError> {
        if let Some(err) = ctx.error() {
            if let Ok(channels) = self.channels.try_lock() {
                channels.exit.signal();
            }
            return Err(err);
        }

        let mut channels = tokio::select! {
            biased;
            err = ctx.done() => return Err(err),
            channels = self.channels.lock() => channels,
        };

        if channels.is_closed() {
            info!(client_id = %self.handler.credentials().client_id, "token handler had stopped, starting a new one");
            *channels = self.handler.token_channels();
        }

        tokio::select! {
            biased;
            err = ctx.done() => {
                debug!(error = %err, "token request abandoned, stopping token handler");
                channels.exit.signal();
                Err(err)
            }
            result = channels.results.recv() => result.unwrap_or(Err(TokenError::HandlerClosed)),
        }
    }

    /// Box `retrieve` for callers that only know the function shape.
    pub fn into_retrieve_fn(self) -> RetrieveTokenFn {
        let retriever = Arc::new(self);
        Arc::new(move |ctx: Context| -> RetrieveFuture {
            let retriever = retriever.clone();
            Box::pin(async move { retriever.retrieve(&ctx).await })
        })
    }
}

impl Drop for TokenRetriever {
    fn drop(&mut self) {
        self.channels.get_mut().exit.signal();
    }
}
