use serde::Deserialize;
use std::time::Duration;

use crate::utils::constants::{
    DEFAULT_ATTEMPT_TIMEOUT_MS, DEFAULT_CLIENT_TIMEOUT_SECS, DEFAULT_GUARD_WINDOW_SECS,
    DEFAULT_INSECURE_DIAL_TIMEOUT_SECS, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY_MS,
};

/// ================================
/// Global service-wide settings
/// ================================
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SettingsConfig {
    /// refresh this long before the token expires
    pub guard_window_seconds: Option<u64>,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    pub server: Option<ServerConfig>,
    pub logging: Option<LoggingConfig>,
}

impl SettingsConfig {
    pub fn guard_window(&self) -> Duration {
        Duration::from_secs(self.guard_window_seconds.unwrap_or(DEFAULT_GUARD_WINDOW_SECS))
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RetryConfig {
    pub attempts: Option<u32>,
    /// deadline for a single exchange attempt
    pub attempt_timeout_ms: Option<u64>,
    /// fixed pause between attempts, no exponential growth
    pub delay_ms: Option<u64>,
}

impl RetryConfig {
    pub fn attempts(&self) -> u32 {
        self.attempts.unwrap_or(DEFAULT_RETRY_ATTEMPTS)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms.unwrap_or(DEFAULT_ATTEMPT_TIMEOUT_MS))
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms.unwrap_or(DEFAULT_RETRY_DELAY_MS))
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct HttpConfig {
    pub timeout_seconds: Option<u64>,
    /// dial and keep-alive timeouts, only applied to the insecure transport
    pub insecure_dial_timeout_seconds: Option<u64>,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(DEFAULT_CLIENT_TIMEOUT_SECS))
    }

    pub fn insecure_dial_timeout(&self) -> Duration {
        Duration::from_secs(
            self.insecure_dial_timeout_seconds
                .unwrap_or(DEFAULT_INSECURE_DIAL_TIMEOUT_SECS),
        )
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_path")]
    pub path: String,
    #[serde(default)]
    pub is_enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            path: default_metrics_path(),
            is_enabled: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: String,
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}
