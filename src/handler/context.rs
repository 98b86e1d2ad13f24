use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::TokenError;

/// Cancellation scope of a single token request.
///
/// A context is done once it is cancelled, its parent is cancelled, or its
/// deadline passes. Clones share the same cancellation.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// Never done unless cancelled explicitly.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// Derived context, cancelled along with `self`. The earlier deadline wins.
    pub fn child(&self, timeout: Option<Duration>) -> Self {
        let deadline = match (self.deadline, timeout.map(|t| Instant::now() + t)) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Self {
            cancel: self.cancel.child_token(),
            deadline,
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// `None` while the context is live, otherwise why it ended.
    pub fn error(&self) -> Option<TokenError> {
        if self.cancel.is_cancelled() {
            return Some(TokenError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(TokenError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves when the context is done.
    pub async fn done(&self) -> TokenError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.cancel.cancelled() => TokenError::Cancelled,
                _ = sleep_until(deadline) => TokenError::DeadlineExceeded,
            },
            None => {
                self.cancel.cancelled().await;
                TokenError::Cancelled
            }
        }
    }
}
