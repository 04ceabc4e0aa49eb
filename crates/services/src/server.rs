use std::net::{IpAddr, SocketAddr};

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub const DEFAULT_MAX_UPLOAD_MB: usize = 64;

/// `RUST_LOG`-driven log output for the service binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    pub fn new(bind: IpAddr, port: u16, max_upload_mb: usize) -> Self {
        Self {
            addr: SocketAddr::new(bind, port),
            max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
        }
    }
}

/// Apply the upload limit and request tracing, then serve until Ctrl-C.
pub async fn serve(router: Router, config: &ServerConfig) -> anyhow::Result<()> {
    let app = router
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http());
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("binding HTTP listener on {}", config.addr))?;
    info!(addr = %config.addr, max_upload_bytes = config.max_upload_bytes, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP router")?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
