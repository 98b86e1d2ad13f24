use http::StatusCode;

use crate::config::credentials::IamVersion;

pub const ERR_RETRY_LIMIT_EXCEEDED: &str = "ErrGenerateTokenRetryLimitExceeded";
pub const ERR_UNEXPECTED_RESPONSE_CODE: &str = "ErrGenerateTokenUnexpectedResponseCode";
pub const ERR_BAD_REQUEST: &str = "ErrGenerateTokenBadRequest";

/// Everything that can go wrong while obtaining a token.
///
/// Credential problems (`Unauthorized`, `Forbidden`) are kept apart from
/// service availability problems (`Internal`, `Transport`) and from local
/// misconfiguration (`Config`) so an operator can tell them apart from the
/// message alone.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid IAM version '{0}', must be one of {supported:?}", supported = IamVersion::supported())]
    Config(String),

    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },

    #[error("client '{client_id}' is not authorized to generate a token, check the client id and secret")]
    Unauthorized { client_id: String },

    #[error("client '{client_id}' is forbidden from generating a token")]
    Forbidden { client_id: String },

    #[error("{code}: {message}")]
    Internal { code: &'static str, message: String },

    #[error("identity service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("token response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("token request cancelled")]
    Cancelled,

    #[error("token request deadline exceeded")]
    DeadlineExceeded,

    #[error("token handler has stopped")]
    HandlerClosed,
}

impl TokenError {
    pub fn retry_limit_exceeded() -> Self {
        TokenError::Internal {
            code: ERR_RETRY_LIMIT_EXCEEDED,
            message: "Retry limit exceeded".to_owned(),
        }
    }

    pub fn unexpected_status(status: StatusCode) -> Self {
        TokenError::Internal {
            code: ERR_UNEXPECTED_RESPONSE_CODE,
            message: format!("Unexpected status code {}", status.as_u16()),
        }
    }

    pub fn bad_request(body: &str) -> Self {
        TokenError::BadRequest {
            code: ERR_BAD_REQUEST,
            message: format!("Bad request: {}", body),
        }
    }

    /// True for errors produced by the caller giving up, not by the exchange.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, TokenError::Cancelled | TokenError::DeadlineExceeded)
    }

    /// Short label used for the failure metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            TokenError::Config(_) => "config",
            TokenError::BadRequest { .. } => "bad_request",
            TokenError::Unauthorized { .. } => "unauthorized",
            TokenError::Forbidden { .. } => "forbidden",
            TokenError::Internal { .. } => "internal",
            TokenError::Transport(_) => "transport",
            TokenError::Decode(_) => "decode",
            TokenError::Cancelled => "cancelled",
            TokenError::DeadlineExceeded => "deadline_exceeded",
            TokenError::HandlerClosed => "handler_closed",
        }
    }
}

/// Statuses the identity service uses for transient failures.
pub fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::INTERNAL_SERVER_ERROR
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::BAD_GATEWAY
}
