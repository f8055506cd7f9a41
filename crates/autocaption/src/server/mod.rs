//! HTTP surface: the upload form, stored images and the caption job API.
//!
//! - `GET  /`                    upload form
//! - `POST /`                    caption an upload, render the result page
//! - `GET  /uploads/{filename}`  serve a stored image
//! - `POST /api/captions`        caption an upload in the background (202)
//! - `GET  /api/captions/{id}`   caption job status
//! - `GET  /api/health`          liveness and scheduler depth

mod error;
mod handlers;
mod pages;

use std::net::SocketAddr;

use autocaption_core::Autocaption;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Allowance for multipart framing and the `length` field on top of the file limit.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the application router.
pub fn router(app: Autocaption) -> Router {
    let body_limit = app.config().max_upload_bytes() + FORM_OVERHEAD_BYTES;

    Router::new()
        .route("/", get(handlers::form).post(handlers::upload))
        .route("/uploads/{filename}", get(handlers::serve_upload))
        .route("/api/captions", post(handlers::create_job))
        .route("/api/captions/{id}", get(handlers::get_job))
        .route("/api/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

/// Serve until Ctrl-C, then stop the post scheduler.
pub async fn serve(app: Autocaption, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    let notifier = app.notifier().clone();
    axum::serve(listener, router(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if notifier.pending() > 0 {
        tracing::warn!(
            pending = notifier.pending(),
            "Shutting down with scheduled posts that will not be published"
        );
    }
    notifier.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
