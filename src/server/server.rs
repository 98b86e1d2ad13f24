use anyhow::{Context, Result};
use crate::config::settings::SettingsConfig;
use crate::observability::metrics::get_metrics;
use crate::observability::routes::MetricsState;
use tracing::info;

/// Start the metrics server when metrics are enabled, otherwise return at once.
pub async fn start(settings_config: &SettingsConfig) -> Result<()> {
    let metrics = get_metrics().await;
    let server = match (&settings_config.server, settings_config.metrics.is_enabled) {
        (Some(server), true) => server,
        _ => {
            info!("metrics server disabled");
            return Ok(());
        }
    };

    let app = MetricsState::new(metrics.registry.clone()).router(&settings_config.metrics);

    let bind_addr = format!("{}:{}", server.host, server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding metrics server to {}", bind_addr))?;
    info!("metrics available at http://{}{}", bind_addr, settings_config.metrics.path);
    metrics.up.set(1);
    axum::serve(listener, app).await.context("metrics server failed")?;

    Ok(())
}
