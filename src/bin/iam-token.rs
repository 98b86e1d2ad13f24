use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::Parser;
use iam_token_handler::config::proc_loader::file_to_config;
use iam_token_handler::handler::{Context, TokenRetriever};
use iam_token_handler::server;
use iam_token_handler::utils::logging::{self, LogLevel};
use tracing::{error, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "iam-token.yaml")]
    config: PathBuf,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
    /// number of retrieve calls, 0 keeps going until interrupted
    #[arg(long, default_value_t = 1)]
    count: u64,
    #[arg(long, default_value_t = 30)]
    interval_seconds: u64,
    /// deadline for each retrieve call
    #[arg(long, default_value_t = 30)]
    timeout_seconds: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config and start logging
    // -------------------------------

    let args = Args::parse();
    let service_config = file_to_config(&args.config).await?;
    logging::run(&service_config.settings, args.log_level);

    // -------------------------------
    // 2. Metrics server (no-op unless enabled)
    // -------------------------------

    let settings = service_config.settings.clone();
    let metrics_server = tokio::spawn(async move {
        if let Err(e) = server::server::start(&settings).await {
            error!("metrics server stopped: {:#}", e);
        }
    });

    // -------------------------------
    // 3. Token handler
    // -------------------------------

    let retriever = TokenRetriever::from_config(service_config.credentials, &service_config.settings)
        .context("building token handler")?;
    info!("token handler ready");

    // -------------------------------
    // 4. Retrieve tokens until done or interrupted
    // -------------------------------

    let shutdown = Context::background();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted, shutting down");
            on_signal.cancel();
        }
    });

    let mut attempts = 0u64;
    let mut retrieved = 0u64;
    loop {
        attempts += 1;
        let ctx = shutdown.child(Some(Duration::from_secs(args.timeout_seconds)));
        match retriever.retrieve(&ctx).await {
            Ok(token) => {
                println!("{}", token);
                retrieved += 1;
            }
            Err(e) if e.is_cancellation() && shutdown.error().is_some() => break,
            Err(e) => error!(error = %e, "token retrieval failed"),
        }

        if args.count != 0 && attempts >= args.count {
            break;
        }

        tokio::select! {
            _ = shutdown.done() => break,
            _ = tokio::time::sleep(Duration::from_secs(args.interval_seconds)) => {}
        }
    }

    metrics_server.abort();
    info!(attempts, retrieved, "done");
    if retrieved == 0 && shutdown.error().is_none() {
        anyhow::bail!("no token could be retrieved");
    }
    Ok(())
}
