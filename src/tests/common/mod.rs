// tests/common/mod.rs
pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use std::net::SocketAddr;

use crate::config::credentials::CredentialConfig;
use crate::config::settings::SettingsConfig;

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

/// Default settings with retry pauses short enough for real-time tests.
pub fn fast_settings() -> SettingsConfig {
    let mut settings = SettingsConfig::default();
    settings.retry.delay_ms = Some(10);
    settings.retry.attempt_timeout_ms = Some(1_000);
    settings
}

/// Tenant credential exchange against `base_url`.
pub fn tenant_credentials(base_url: &str) -> CredentialConfig {
    CredentialConfig::new(base_url, "t1", "c1", "s1", "glcs").with_vended_service_client(false)
}

pub fn token_json(token: &str, expires_in: i64) -> String {
    json!({"access_token": token, "expires_in": expires_in, "token_type": "Bearer"}).to_string()
}
