//! Shared constants and invariants

pub const DEFAULT_GUARD_WINDOW_SECS: u64 = 60;

pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_ATTEMPT_TIMEOUT_MS: u64 = 3_000;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 5_000;

pub const DEFAULT_CLIENT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_INSECURE_DIAL_TIMEOUT_SECS: u64 = 30;

pub const TOKEN_PATH: &str = "/v1/token";
pub const GRANT_TYPE_CLIENT_CREDENTIALS: &str = "client_credentials";
pub const GLCS_SCOPE: &str = "hpe-tenant";

/// Lookup key under which the retrieve function is handed to business logic.
pub const TOKEN_RETRIEVE_FUNC_KEY: &str = "tokenRetrieveFunc";
