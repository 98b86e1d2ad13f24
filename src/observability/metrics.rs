use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use tracing::info;
use std::sync::Arc;
use tokio::sync::OnceCell;

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE.get_or_init(|| async {
        info!("Initializing Metrics ...");
        Metrics::new()}
    ).await
}

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Exchange metrics
    pub exchange_requests: IntCounterVec,
    pub exchange_attempts: IntCounter,
    pub exchange_retries: IntCounter,
    pub exchange_failures: IntCounterVec,
    pub exchange_duration: HistogramVec,

    // Handler / cache metrics
    pub token_cache_hits: IntCounter,
    pub token_refreshes: IntCounter,
    pub token_expiry_unix: IntGauge,

    // Config/runtime
    pub config_parse_failures: IntCounter,
    pub config_validation_errors: IntCounter,
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("iamtoken".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Exchange
            exchange_requests: IntCounterVec::new(Opts::new("exchange_requests_total", "Token exchanges started by strategy"), &["strategy"],).unwrap(),
            exchange_attempts: IntCounter::new("exchange_attempts_total", "HTTP attempts made against the identity service").unwrap(),
            exchange_retries: IntCounter::new("exchange_retries_total", "Attempts retried after a timeout or retryable status").unwrap(),
            exchange_failures: IntCounterVec::new(Opts::new("exchange_failures_total", "Failed token exchanges by error kind"), &["kind"],).unwrap(),
            exchange_duration: HistogramVec::new(HistogramOpts::new("exchange_duration_seconds", "Token exchange duration seconds").buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]), &["strategy"],).unwrap(),

            // Handler
            token_cache_hits: IntCounter::new("token_cache_hits_total", "Token requests served from the cached token").unwrap(),
            token_refreshes: IntCounter::new("token_refreshes_total", "Tokens replaced by a fresh exchange").unwrap(),
            token_expiry_unix: IntGauge::new("token_expiry_unix_seconds", "Expiry of the cached token").unwrap(),

            // Config/runtime
            config_parse_failures: IntCounter::new("config_parse_failures_total", "Config files that failed to parse").unwrap(),
            config_validation_errors: IntCounter::new("config_validation_errors_total", "Validation errors during startup").unwrap(),
            up: IntGauge::new("up", "1 if service is healthy").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.exchange_requests.clone())).unwrap();
        reg.register(Box::new(metrics.exchange_attempts.clone())).unwrap();
        reg.register(Box::new(metrics.exchange_retries.clone())).unwrap();
        reg.register(Box::new(metrics.exchange_failures.clone())).unwrap();
        reg.register(Box::new(metrics.exchange_duration.clone())).unwrap();
        reg.register(Box::new(metrics.token_cache_hits.clone())).unwrap();
        reg.register(Box::new(metrics.token_refreshes.clone())).unwrap();
        reg.register(Box::new(metrics.token_expiry_unix.clone())).unwrap();
        reg.register(Box::new(metrics.config_parse_failures.clone())).unwrap();
        reg.register(Box::new(metrics.config_validation_errors.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        metrics
    }
}
