//! HTTP surface: routes, middleware and the serve loop.

mod handlers;
mod state;
mod tls;

pub use state::ServiceSlot;

use crate::config::ServerConfig;
use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use axum_server::Handle;
use std::time::Duration;
use tower_http::compression::predicate::SizeAbove;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Responses smaller than this are sent uncompressed.
const COMPRESSION_MIN_BYTES: u16 = 500;

/// Build the application router.
pub fn router(slot: ServiceSlot, allowed_origins: &[String]) -> Result<Router> {
    let origins = allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).with_context(|| format!("invalid CORS origin {origin}"))
        })
        .collect::<Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    let compression = CompressionLayer::new().compress_when(SizeAbove::new(COMPRESSION_MIN_BYTES));

    Ok(Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/api/v1/quote", get(handlers::quote))
        .with_state(slot)
        .layer(compression)
        .layer(TraceLayer::new_for_http())
        .layer(cors))
}

/// Serve `app` until Ctrl-C or SIGTERM.
///
/// On a signal the slot is emptied first, so new quote requests get 503 while
/// in-flight ones drain for at most `shutdown_grace`.
pub async fn serve(config: &ServerConfig, app: Router, slot: ServiceSlot) -> Result<()> {
    let handle = Handle::new();
    tokio::spawn(shutdown_on_signal(handle.clone(), slot, config.shutdown_grace));

    let scheme = if config.tls.is_some() { "https" } else { "http" };
    let listening = handle.clone();
    tokio::spawn(async move {
        if let Some(addr) = listening.listening().await {
            info!("Listening on {scheme}://{addr}");
        }
    });

    let served = match &config.tls {
        Some(tls) => {
            let rustls = tls::rustls_config_from_paths(&tls.cert_path, &tls.key_path)
                .await
                .context("Failed to load TLS certificate")?;
            axum_server::bind_rustls(config.listen, rustls)
                .handle(handle)
                .serve(app.into_make_service())
                .await
        }
        None => {
            axum_server::bind(config.listen)
                .handle(handle)
                .serve(app.into_make_service())
                .await
        }
    };
    served.with_context(|| format!("Server on {} failed", config.listen))
}

async fn shutdown_on_signal(handle: Handle, slot: ServiceSlot, grace: Duration) {
    wait_for_signal().await;
    warn!(grace_s = grace.as_secs(), "shutdown signal received, draining requests");
    // In-flight handlers keep their own Arc; the service drops after the last one.
    drop(slot.take());
    handle.graceful_shutdown(Some(grace));
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
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
}
