use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::error::TokenError;

/// IAM flavours understood by the identity service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IamVersion {
    Glcs,
    Glp,
}

pub const IAM_VERSION_GLCS: &str = "glcs";
pub const IAM_VERSION_GLP: &str = "glp";

impl IamVersion {
    pub fn supported() -> [&'static str; 2] {
        [IAM_VERSION_GLCS, IAM_VERSION_GLP]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IamVersion::Glcs => IAM_VERSION_GLCS,
            IamVersion::Glp => IAM_VERSION_GLP,
        }
    }
}

impl FromStr for IamVersion {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            IAM_VERSION_GLCS => Ok(IamVersion::Glcs),
            IAM_VERSION_GLP => Ok(IamVersion::Glp),
            other => Err(TokenError::Config(other.to_owned())),
        }
    }
}

impl fmt::Display for IamVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ================================
/// Credentials for one token lineage
/// ================================
///
/// Immutable once a handler has been built from it.
#[derive(Clone, Deserialize)]
pub struct CredentialConfig {
    pub iam_service_url: String,
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    /// raw value, checked when the exchange request is built
    #[serde(default = "default_iam_version")]
    pub iam_version: String,
    #[serde(default)]
    pub iam_insecure: bool,
    /// selects the form-encoded issuer exchange instead of the tenant JSON one
    #[serde(default = "default_vended_service_client")]
    pub api_vended_service_client: bool,
    /// pre-supplied token, disables generation and refresh
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub iam_token: Option<String>,
}

impl CredentialConfig {
    pub fn new(
        iam_service_url: impl Into<String>,
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        iam_version: impl Into<String>,
    ) -> Self {
        Self {
            iam_service_url: iam_service_url.into(),
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            iam_version: iam_version.into(),
            iam_insecure: false,
            api_vended_service_client: default_vended_service_client(),
            iam_token: None,
        }
    }

    pub fn with_insecure(mut self, iam_insecure: bool) -> Self {
        self.iam_insecure = iam_insecure;
        self
    }

    pub fn with_vended_service_client(mut self, vended: bool) -> Self {
        self.api_vended_service_client = vended;
        self
    }

    pub fn with_static_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.iam_token = (!token.is_empty()).then_some(token);
        self
    }

    /// Service URL without trailing slashes.
    pub fn base_url(&self) -> &str {
        self.iam_service_url.trim_end_matches('/')
    }

    pub fn static_token(&self) -> Option<&str> {
        self.iam_token.as_deref()
    }
}

// secrets stay out of logs
impl fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("iam_service_url", &self.iam_service_url)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("iam_version", &self.iam_version)
            .field("iam_insecure", &self.iam_insecure)
            .field("api_vended_service_client", &self.api_vended_service_client)
            .field("iam_token", &self.iam_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn default_iam_version() -> String {
    IAM_VERSION_GLCS.to_owned()
}

fn default_vended_service_client() -> bool {
    true
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_empty()))
}
