//! Policy Dashboard - API Server Binary
//!
//! This binary starts the HTTP API server for the policy dashboard.
//!
//! # Usage
//!
//! ```bash
//! # Read through the hosted data platform
//! API_PLATFORM_URL=https://project.example.co API_PLATFORM_API_KEY=... cargo run --bin policy-dashboard-api
//!
//! # Read the policy tables directly
//! API_BACKEND=postgres API_DATABASE_URL=postgres://... cargo run --bin policy-dashboard-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_JWT_EXPIRATION_SECS` - JWT token expiration in seconds (default: 3600)
//! * `API_SESSION_IDLE_SECS` - Idle time before a dashboard session is evicted (default: 1800)
//! * `API_BACKEND` - `rest` (default) or `postgres`
//! * `API_PLATFORM_URL` / `API_PLATFORM_API_KEY` - Data platform endpoint and key
//! * `API_PLATFORM_TIMEOUT_SECS` - Upstream request timeout (default: 30)
//! * `API_DATABASE_URL` - PostgreSQL connection string
//! * `API_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use domain_policy::adapters::{RestGateway, RestGatewayConfig};
use domain_policy::DataGateway;
use infra_db::{create_pool, DatabaseConfig, PostgresGateway};
use interface_api::config::{ApiConfig, GatewayBackend};
use interface_api::create_router;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Main entry point for the API server.
///
/// Initializes logging, loads configuration, builds the data gateway, and
/// starts the HTTP server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("loading configuration")?;
    init_tracing(&config.log_level);
    config.validate().context("validating configuration")?;

    tracing::info!(
        host = %config.host,
        port = %config.port,
        backend = ?config.backend,
        "Starting policy dashboard API server"
    );

    let gateway = build_gateway(&config).await?;
    let health = gateway.health_check().await;
    if !health.is_healthy() {
        tracing::warn!(
            adapter = %health.adapter_id,
            message = ?health.message,
            "Data gateway is not healthy yet; serving anyway"
        );
    }

    let addr: SocketAddr = config.server_addr().parse().context("parsing server address")?;
    let app = create_router(gateway, config);

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Builds the gateway for the configured backend.
async fn build_gateway(config: &ApiConfig) -> anyhow::Result<Arc<dyn DataGateway>> {
    match config.backend {
        GatewayBackend::Rest => {
            let gateway = RestGateway::new(RestGatewayConfig {
                base_url: config.platform_url.clone(),
                api_key: config.platform_api_key.clone(),
                access_token: None,
                timeout_secs: config.platform_timeout_secs,
            })
            .context("building data platform client")?;
            Ok(Arc::new(gateway))
        }
        GatewayBackend::Postgres => {
            let pool = create_pool(DatabaseConfig::new(config.database_url.as_str()))
                .await
                .context("connecting to database")?;
            Ok(Arc::new(PostgresGateway::new(pool)))
        }
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
