//! Axum API server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use starvid_api::{create_router, metrics, ApiConfig, AppState, StaleJobDetector};
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

fn fail(msg: &str, err: impl std::fmt::Display) -> ! {
    error!("{}: {}", msg, err);
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let tls_ready = rustls::crypto::ring::default_provider()
        .install_default()
        .is_ok();

    init_tracing();

    if !tls_ready {
        warn!("A rustls crypto provider was already installed");
    }

    info!("Starting starvid-api");

    let mut config = ApiConfig::from_env();
    info!("API config: host={}, port={}", config.host, config.port);

    let backend_config = BackendConfig::from_env()
        .unwrap_or_else(|e| fail("Invalid backend configuration", e));
    let backends = backend_config
        .connect()
        .await
        .unwrap_or_else(|e| fail("Failed to connect backends", e));

    if backends.is_in_memory() && !config.embedded_worker {
        warn!("STATE_BACKEND=memory requires the embedded worker; enabling it");
        config.embedded_worker = true;
    }

    let state = AppState::new(config.clone(), &backends);
    if let Err(e) = state.artifacts.ensure_dir().await {
        fail("Failed to create videos directory", e);
    }

    let metrics_handle = if config.metrics_enabled {
        match metrics::init_metrics() {
            Ok(handle) => {
                info!("Prometheus metrics enabled at /metrics");
                Some(handle)
            }
            Err(e) => {
                warn!("Failed to install Prometheus recorder: {}", e);
                None
            }
        }
    } else {
        None
    };

    let stale_detector = StaleJobDetector::new(
        state.jobs.clone(),
        config.stale_job_timeout,
        config.stale_detection_enabled,
    );
    tokio::spawn(async move {
        stale_detector.run().await;
    });

    let worker = if config.embedded_worker {
        let ctx = ProcessingContext::from_env(&backends)
            .unwrap_or_else(|e| fail("Failed to build processing context", e));
        let executor = Arc::new(JobExecutor::new(WorkerConfig::from_env(), ctx));
        let runner = Arc::clone(&executor);
        let handle = tokio::spawn(async move {
            if let Err(e) = runner.run().await {
                error!("Embedded worker stopped: {}", e);
            }
        });
        info!("Embedded worker started");
        Some((executor, handle))
    } else {
        None
    };

    let app = create_router(state, metrics_handle);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .unwrap_or_else(|e| fail("Invalid bind address", e));

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| fail("Failed to bind", e));

    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    {
        error!("Server error: {}", e);
    }

    if let Some((executor, handle)) = worker {
        executor.shutdown();
        handle.await.ok();
    }

    info!("Server shutdown complete");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for CTRL+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
