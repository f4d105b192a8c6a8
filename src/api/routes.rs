use crate::api::handlers::{
    events_handler, health, message_handler, root, ws_handler, AppState,
};
use axum::{
    extract::Request,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::Level;

pub fn create_router(state: AppState) -> Router {
    // Informational and health routes
    let public_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health));

    // MCP transports
    let mcp_routes = Router::new()
        .route("/sse", get(ws_handler))
        .route("/events", get(events_handler))
        .route("/messages", post(message_handler));

    Router::new()
        .merge(public_routes)
        .merge(mcp_routes)
        .with_state(Arc::new(state))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(|request: &Request| {
                            tracing::span!(
                                Level::INFO,
                                "http_request",
                                method = %request.method(),
                                uri = %request.uri(),
                            )
                        })
                        .on_request(|_request: &Request, _span: &tracing::Span| {
                            tracing::event!(Level::DEBUG, "received request");
                        })
                        .on_response(
                            |_response: &axum::response::Response,
                             latency: std::time::Duration,
                             _span: &tracing::Span| {
                                tracing::event!(Level::INFO, latency = ?latency, "request completed");
                            },
                        )
                        .on_failure(
                            |_error: tower_http::classify::ServerErrorsFailureClass,
                             _latency: std::time::Duration,
                             _span: &tracing::Span| {
                                tracing::event!(Level::ERROR, "request failed");
                            },
                        ),
                )
                .layer(CorsLayer::permissive()),
        )
}
