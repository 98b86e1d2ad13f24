use std::time::Duration;

use crate::helpers::time::now_i64;

/// When a token stops being usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// UNIX timestamp, seconds
    At(i64),
    /// passed-in tokens are never refreshed
    Never,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    pub expiry: Expiry,
}

impl Token {
    pub fn new(value: String, exp_unix_ts: i64) -> Self {
        Self {
            value,
            expiry: Expiry::At(exp_unix_ts),
        }
    }

    pub fn never_expiring(value: String) -> Self {
        Self {
            value,
            expiry: Expiry::Never,
        }
    }

    /// Token is due once `now` enters the guard window before expiry.
    pub fn needs_refresh_at(&self, guard_window: Duration, now_unix_ts: i64) -> bool {
        match self.expiry {
            Expiry::Never => false,
            Expiry::At(exp) => {
                let guard = i64::try_from(guard_window.as_secs()).unwrap_or(i64::MAX);
                exp.saturating_sub(guard) <= now_unix_ts
            }
        }
    }

    pub fn needs_refresh(&self, guard_window: Duration) -> bool {
        self.needs_refresh_at(guard_window, now_i64())
    }

    pub fn exp_unix_ts(&self) -> Option<i64> {
        match self.expiry {
            Expiry::At(exp) => Some(exp),
            Expiry::Never => None,
        }
    }
}
