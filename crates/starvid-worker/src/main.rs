//! Star history worker binary.

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use starvid_worker::{BackendConfig, JobExecutor, ProcessingContext, WorkerConfig};

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("starvid=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(env_filter)
            .init();
    }
}

#[tokio::main]
async fn main() {
    // GitHub calls go over rustls
    let tls_ready = rustls::crypto::ring::default_provider()
        .install_default()
        .is_ok();

    dotenvy::dotenv().ok();
    init_tracing();

    if !tls_ready {
        warn!("A rustls crypto provider was already installed");
    }

    info!("Starting starvid-worker");

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let backend_config = match BackendConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid backend configuration: {}", e);
            std::process::exit(1);
        }
    };

    let backends = match backend_config.connect().await {
        Ok(b) => b,
        Err(e) => {
            error!("Failed to connect backends: {}", e);
            std::process::exit(1);
        }
    };

    if backends.is_in_memory() {
        warn!(
            "STATE_BACKEND=memory in a standalone worker: jobs submitted to the API are not visible here"
        );
    }

    let ctx = match ProcessingContext::from_env(&backends) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Failed to build processing context: {}", e);
            std::process::exit(1);
        }
    };

    let executor = Arc::new(JobExecutor::new(config, ctx));

    let signal_executor = Arc::clone(&executor);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            signal_executor.shutdown();
        }
    });

    if let Err(e) = executor.run().await {
        error!("Executor error: {}", e);
        std::process::exit(1);
    }

    info!("Worker shutdown complete");
}
