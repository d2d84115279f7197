//! HTTP surface of the probe.
//!
//! Provides two endpoints:
//! - `POST /check` - runs one check (bearer-authenticated when an API key is set)
//! - `GET /health` - unauthenticated liveness with region, version and counters
//!
//! A background task sweeps the DNS cache and cookie store while the server runs.

mod handlers;
mod types;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::check::Prober;
use crate::config::SWEEP_INTERVAL;
use crate::error_handling::InitializationError;
use handlers::{check_handler, health_handler, require_bearer};
pub use types::{AppState, HealthResponse};

/// Builds the router, without binding it.
pub fn build_router(prober: Arc<Prober>) -> Router {
    let state = AppState { prober };

    let authenticated = Router::new()
        .route("/check", post(check_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .merge(authenticated)
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Binds the configured address and serves until Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the address can't be bound or the server fails.
pub async fn run_server(prober: Arc<Prober>) -> Result<(), anyhow::Error> {
    let addr = prober.config().bind.clone();
    if prober.config().api_key.is_none() {
        log::warn!("No API key configured; /check accepts unauthenticated requests");
    }

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| InitializationError::ServerBindError {
            addr: addr.clone(),
            source,
        })?;

    log::info!(
        "Check server for region {} listening on http://{}/",
        prober.config().region,
        listener.local_addr()?
    );
    log::info!("  - Check: POST /check");
    log::info!("  - Health: GET /health");

    let cancel = CancellationToken::new();
    let sweeper = tokio::spawn(sweep_caches(Arc::clone(&prober), cancel.clone()));

    let served = axum::serve(listener, build_router(prober))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Check server error: {}", e));

    cancel.cancel();
    let _ = sweeper.await;
    log::info!("Check server stopped");
    served
}

async fn sweep_caches(prober: Arc<Prober>, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(SWEEP_INTERVAL);
    // The first tick completes immediately
    interval.tick().await;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let (dns, jars) = prober.sweep_caches();
                if dns > 0 || jars > 0 {
                    log::debug!("Swept {dns} DNS cache entries and {jars} cookie jars");
                }
            }
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {e}");
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
                log::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("Shutdown signal received, draining in-flight checks");
}
