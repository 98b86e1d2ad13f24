//! # IAM Token Handler Library
//!
//! Issues and continuously refreshes short-lived bearer tokens for outbound
//! API calls, keeping callers away from the latency and failure modes of the
//! identity service.
//!
//! Modules:
//! - `config` — credentials, settings and YAML loading
//! - `sources` — identity service client and the two exchange wire formats
//! - `resilience` — fixed-delay retry of exchange attempts
//! - `handler` — refresh loop, channel pair and the cancellable retriever
//! - `cache` / `parser` — token model and expiry derivation

pub mod cache;
pub mod config;
pub mod error;
pub mod handler;
pub mod helpers;
pub mod observability;
pub mod parser;
pub mod resilience;
pub mod server;
pub mod sources;
#[cfg(test)]
mod tests;
pub mod utils;

pub use crate::config::credentials::{CredentialConfig, IamVersion};
pub use crate::config::settings::SettingsConfig;
pub use crate::error::TokenError;
pub use crate::handler::{Context, RetrieveTokenFn, TokenHandler, TokenRetriever};
pub use crate::utils::constants::TOKEN_RETRIEVE_FUNC_KEY;
