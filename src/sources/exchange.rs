//! Wire formats for the two token exchanges.
//!
//! * tenant credentials: JSON `{tenant_id, client_id, client_secret, grant_type}`
//!   posted to `{base}/v1/token`
//! * issuer client credentials: form-encoded `client_id, client_secret,
//!   grant_type[, scope]` posted to `{base}/v1/token` (glcs, with the
//!   `hpe-tenant` scope) or to `{base}` itself (glp)

use serde::{Deserialize, Serialize};

use crate::config::credentials::{CredentialConfig, IamVersion};
use crate::error::TokenError;
use crate::utils::constants::{GLCS_SCOPE, GRANT_TYPE_CLIENT_CREDENTIALS, TOKEN_PATH};

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";

const ERR_ENCODE_REQUEST: &str = "ErrGenerateTokenEncodeRequest";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeStrategy {
    TenantCredentials,
    IssuerClientCredentials(IamVersion),
}

impl ExchangeStrategy {
    /// The IAM version is checked for both strategies so a typo never goes
    /// unnoticed just because the tenant exchange ignores it.
    pub fn select(credentials: &CredentialConfig) -> Result<Self, TokenError> {
        let iam_version: IamVersion = credentials.iam_version.parse()?;
        if credentials.api_vended_service_client {
            Ok(ExchangeStrategy::IssuerClientCredentials(iam_version))
        } else {
            Ok(ExchangeStrategy::TenantCredentials)
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExchangeStrategy::TenantCredentials => "tenant_credentials",
            ExchangeStrategy::IssuerClientCredentials(_) => "issuer_client_credentials",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantTokenRequest {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub grant_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeBody {
    Json(TenantTokenRequest),
    Form(Vec<(&'static str, String)>),
}

/// A fully prepared exchange, reusable across retry attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRequest {
    pub strategy: ExchangeStrategy,
    pub url: String,
    pub body: ExchangeBody,
}

impl ExchangeRequest {
    pub fn build(credentials: &CredentialConfig) -> Result<Self, TokenError> {
        let strategy = ExchangeStrategy::select(credentials)?;
        let base = credentials.base_url();

        let request = match strategy {
            ExchangeStrategy::TenantCredentials => ExchangeRequest {
                strategy,
                url: format!("{}{}", base, TOKEN_PATH),
                body: ExchangeBody::Json(TenantTokenRequest {
                    tenant_id: credentials.tenant_id.clone(),
                    client_id: credentials.client_id.clone(),
                    client_secret: credentials.client_secret.clone(),
                    grant_type: GRANT_TYPE_CLIENT_CREDENTIALS.to_owned(),
                }),
            },
            ExchangeStrategy::IssuerClientCredentials(iam_version) => {
                let mut params = vec![
                    ("client_id", credentials.client_id.clone()),
                    ("client_secret", credentials.client_secret.clone()),
                    ("grant_type", GRANT_TYPE_CLIENT_CREDENTIALS.to_owned()),
                ];
                let url = match iam_version {
                    IamVersion::Glcs => {
                        params.push(("scope", GLCS_SCOPE.to_owned()));
                        format!("{}{}", base, TOKEN_PATH)
                    }
                    IamVersion::Glp => base.to_owned(),
                };
                ExchangeRequest {
                    strategy,
                    url,
                    body: ExchangeBody::Form(params),
                }
            }
        };
        Ok(request)
    }

    pub fn content_type(&self) -> &'static str {
        match self.body {
            ExchangeBody::Json(_) => CONTENT_TYPE_JSON,
            ExchangeBody::Form(_) => CONTENT_TYPE_FORM,
        }
    }

    pub fn encoded_body(&self) -> Result<String, TokenError> {
        let encoded = match &self.body {
            ExchangeBody::Json(body) => serde_json::to_string(body).map_err(|e| e.to_string()),
            ExchangeBody::Form(params) => serde_urlencoded::to_string(params).map_err(|e| e.to_string()),
        };
        encoded.map_err(|message| TokenError::Internal {
            code: ERR_ENCODE_REQUEST,
            message,
        })
    }

    /// The issuer exchange asks for a fresh connection on every attempt.
    pub fn close_connection(&self) -> bool {
        matches!(self.strategy, ExchangeStrategy::IssuerClientCredentials(_))
    }

    pub fn decode_response(&self, body: &[u8]) -> Result<IssuedToken, TokenError> {
        let issued = match self.strategy {
            ExchangeStrategy::TenantCredentials => {
                serde_json::from_slice::<IdentityTokenResponse>(body)?.into()
            }
            ExchangeStrategy::IssuerClientCredentials(_) => {
                serde_json::from_slice::<IssuerTokenResponse>(body)?.into()
            }
        };
        Ok(issued)
    }
}

/// Response of the tenant credential exchange.
#[derive(Debug, Deserialize)]
pub struct IdentityTokenResponse {
    #[serde(default)]
    pub token_type: String,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: String,
    #[serde(default, rename = "accessTokenOnly")]
    pub access_token_only: bool,
}

/// Response of the issuer client credentials exchange.
#[derive(Debug, Deserialize)]
pub struct IssuerTokenResponse {
    #[serde(default)]
    pub token_type: String,
    pub expires_in: Option<i64>,
    pub access_token: String,
    #[serde(default)]
    pub scope: String,
}

/// What the handler needs from either response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_in: Option<i64>,
}

impl From<IdentityTokenResponse> for IssuedToken {
    fn from(response: IdentityTokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            expires_in: response.expires_in,
        }
    }
}

impl From<IssuerTokenResponse> for IssuedToken {
    fn from(response: IssuerTokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            expires_in: response.expires_in,
        }
    }
}
