//! HTTP scrape endpoint.
//!
//! A single route, `GET /metrics`, serving the Prometheus text exposition
//! of the gauge registry. The server runs for the process lifetime and
//! keeps answering even when the registry holds stale values.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tracing::{error, info};

use crate::registry::MetricRegistry;

/// Builds the scrape router.
pub fn router(registry: Arc<MetricRegistry>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(registry)
}

/// Binds and serves until `shutdown` resolves.
///
/// A bind failure is returned to the caller; it is the only fatal error
/// class in the server.
pub async fn serve(
    registry: Arc<MetricRegistry>,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("metrics endpoint listening on http://{}/metrics", addr);

    axum::serve(listener, router(registry))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn metrics_handler(State(registry): State<Arc<MetricRegistry>>) -> Response {
    match registry.encode() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("failed to encode metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
