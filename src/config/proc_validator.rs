//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Covers credentials (service URL, IAM version, required ids per exchange
//!   strategy) and settings (retry, logging, metrics/server).

use reqwest::Url;
use tracing::{error, info};

use crate::config::credentials::{CredentialConfig, IamVersion};
use crate::config::settings::{RetryConfig, SettingsConfig};
use crate::config::ServiceConfig;
use crate::observability::metrics::get_metrics;

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub async fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_credentials(&cfg.credentials, &mut errors);
    validate_settings(&cfg.settings, &mut errors);

    if errors.is_empty() {
        info!("config valid");
        Ok(())
    } else {
        error!("configuration validation errors ({}):", errors.len());
        for e in &errors {
            error!(" - {}", e);
        }
        get_metrics().await.config_validation_errors.inc();
        Err(errors)
    }
}

/// CREDENTIALS VALIDATION
fn validate_credentials(credentials: &CredentialConfig, errors: &mut Vec<String>) {
    match Url::parse(credentials.base_url()) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(format!(
            "credentials.iam_service_url '{}' must use http or https, got '{}'",
            credentials.iam_service_url,
            url.scheme()
        )),
        Err(e) => errors.push(format!(
            "credentials.iam_service_url '{}' must be a valid URL: {}",
            credentials.iam_service_url, e
        )),
    }

    if credentials.iam_version.parse::<IamVersion>().is_err() {
        errors.push(format!(
            "credentials.iam_version '{}' invalid; allowed: {:?}",
            credentials.iam_version,
            IamVersion::supported()
        ));
    }

    // a passed-in token never reaches the identity service
    if credentials.static_token().is_some() {
        return;
    }

    if credentials.client_id.trim().is_empty() {
        errors.push("credentials.client_id is required when iam_token is not set".to_string());
    }
    if credentials.client_secret.trim().is_empty() {
        errors.push("credentials.client_secret is required when iam_token is not set".to_string());
    }
    if !credentials.api_vended_service_client && credentials.tenant_id.trim().is_empty() {
        errors.push(
            "credentials.tenant_id is required when api_vended_service_client is false".to_string(),
        );
    }
}

/// SETTINGS VALIDATION
fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    validate_retry("settings.retry", &settings.retry, errors);

    if let Some(s) = settings.guard_window_seconds {
        if s > 60 * 60 * 24 {
            errors.push(format!(
                "settings.guard_window_seconds ({}) is unreasonably large",
                s
            ));
        }
    }

    if settings.http.timeout_seconds == Some(0) {
        errors.push("settings.http.timeout_seconds must be > 0".to_string());
    }

    let metrics = &settings.metrics;
    if !metrics.path.starts_with('/') {
        errors.push(format!(
            "settings.metrics.path '{}' must start with '/'",
            metrics.path
        ));
    }
    if metrics.is_enabled {
        match &settings.server {
            Some(server) => {
                if server.host.is_empty() {
                    errors.push("settings.server.host must not be empty".to_string());
                }
                if server.port.parse::<u16>().is_err() {
                    errors.push(format!(
                        "settings.server.port '{}' must be a valid port",
                        server.port
                    ));
                }
            }
            None => errors.push(
                "settings.server is required when settings.metrics.is_enabled is true".to_string(),
            ),
        }
    }

    if let Some(logging) = &settings.logging {
        let valid = ["trace", "debug", "info", "warn", "error"];
        if !valid.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' invalid; allowed: {:?}",
                logging.level, valid
            ));
        }
    }
}

fn validate_retry(path: &str, retry: &RetryConfig, errors: &mut Vec<String>) {
    if retry.attempts == Some(0) {
        errors.push(format!("{}.attempts must be > 0", path));
    }
    if retry.attempt_timeout_ms == Some(0) {
        errors.push(format!("{}.attempt_timeout_ms must be > 0", path));
    }
}
