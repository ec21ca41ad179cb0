//! HTTP API.
//!
//! Handlers are thin: they extract input, hand a closure to
//! [`DatabaseManager::call`], and map the result to a status code. Errors
//! render through [`ParksError`]'s `IntoResponse`.

mod extract;
mod handlers;

pub use extract::{ApiJson, ApiPath, ApiQuery, ChangedBy};

use crate::config::{CodeSettings, ServerConfig};
use crate::db::DatabaseManager;
use crate::error::ParksError;
use crate::metrics;
use axum::{
    extract::{MatchedPath, Request},
    http::{header, Method, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseManager,
    pub codes: CodeSettings,
}

impl AppState {
    pub fn new(db: DatabaseManager, codes: CodeSettings) -> Self {
        Self { db, codes }
    }
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "parks-backoffice",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn prometheus_metrics() -> Response {
    match metrics::render() {
        Some(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed").into_response(),
    }
}

async fn api_not_found(uri: Uri) -> ParksError {
    ParksError::not_found("route", uri.path())
}

const UNMATCHED_ROUTE: &str = "unmatched";

/// Wrap each request in a span with a fresh request id and record its outcome.
async fn track_requests(req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    // Unmatched paths share one label so arbitrary URLs cannot grow the registry.
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_owned());

    let span = info_span!("http_request", %request_id, %method, %path, route = %route);
    let started = Instant::now();
    let response = next.run(req).instrument(span.clone()).await;
    let elapsed = started.elapsed();
    let status = response.status();

    metrics::record_http_request(method.as_str(), &route, status.as_u16(), elapsed);
    span.in_scope(|| {
        info!(
            status = status.as_u16(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Handled request"
        )
    });
    response
}

/// Create the HTTP server with all routes
pub fn create_server(state: AppState, static_dir: Option<&Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let api = handlers::routes().fallback(api_not_found);

    let mut app = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(prometheus_metrics))
        .nest("/api", api)
        .with_state(state);

    // Serve the prebuilt dashboard for everything else
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(
        ServiceBuilder::new()
            .layer(middleware::from_fn(track_requests))
            .layer(cors),
    )
}

/// Start the HTTP server on the configured address
pub async fn start_server(state: AppState, config: &ServerConfig) -> anyhow::Result<()> {
    let app = create_server(state, config.static_dir.as_deref());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("HTTP server running on http://{}", addr);
    info!("Health check: http://{}/health", addr);
    if let Some(dir) = &config.static_dir {
        info!("Serving dashboard from {}", dir.display());
    }

    axum::serve(listener, app).await?;
    Ok(())
}
