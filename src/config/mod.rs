use serde::Deserialize;

use crate::config::credentials::CredentialConfig;
use crate::config::settings::SettingsConfig;

pub mod credentials;
pub mod proc_loader;
pub mod proc_validator;
pub mod settings;

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub credentials: CredentialConfig,
    #[serde(default)]
    pub settings: SettingsConfig,
}
