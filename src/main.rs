//! Synapse router server entrypoint.

use std::net::SocketAddr;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use synapse::config::Config;
use synapse::gateway::{AppState, create_router_with_state};
use synapse::observability;
use synapse::tenant::TenantRegistry;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        name = %config.router_name,
        version = %config.router_version,
        bind_addr = %config.bind_addr,
        port = config.port,
        tenancy = config.tenancy_enable,
        "router starting"
    );

    if config.metrics_enable
        && let Err(e) = observability::init_metrics()
    {
        tracing::warn!(error = %e, "metrics recorder unavailable, /metrics will report 503");
    }

    let tenants = TenantRegistry::load(&config.tenants_config)?;
    tracing::info!(
        path = %config.tenants_config,
        tenants = tenants.len(),
        "tenant registry loaded"
    );

    let state = AppState::from_config(config, tenants);

    // Best-effort: a cold store defers schema creation to first use.
    state.semantic.ensure_ready().await;

    let app = create_router_with_state(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("router shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C, shutting down");
        }
        _ = terminate => {
            tracing::info!("received SIGTERM, shutting down");
        }
    }
}
