//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, compression,
//! and all endpoint handlers.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use gridmap_core::{GridmapConfig, Result};

use crate::handlers;
use crate::state::AppState;

/// Map front-ends run from a local dev server on any port.
fn is_local_origin(origin: &HeaderValue) -> bool {
    origin.to_str().is_ok_and(|o| {
        o.starts_with("http://localhost:") || o.starts_with("http://127.0.0.1:")
    })
}

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin, _| is_local_origin(origin)))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/stations", get(handlers::list_stations))
        .route("/stations/grouped", get(handlers::grouped_stations))
        .route("/stations/{id}", get(handlers::get_station))
        .route("/chat", post(handlers::chat))
        .route("/chat/history", get(handlers::chat_history))
        .route("/annotate", post(handlers::annotate_text))
        .route(
            "/selection",
            get(handlers::get_selection).post(handlers::select_station),
        )
        .route("/filter", get(handlers::get_filter))
        .route("/sections/{zone}/toggle", post(handlers::toggle_section))
        .route("/sidebar/toggle", post(handlers::toggle_sidebar))
        .route("/map/markers", get(handlers::map_markers))
        .route("/map/camera", get(handlers::map_camera))
        .layer(CompressionLayer::new());

    // SSE stream stays uncompressed so events flush immediately.
    let stream_routes = Router::new().route("/stream", get(handlers::stream));

    api_routes
        .merge(stream_routes)
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server.
///
/// Binds to 127.0.0.1 (localhost only) on the configured port.
pub async fn start_server(config: &GridmapConfig, state: AppState) -> Result<()> {
    let addr = format!("127.0.0.1:{}", config.general.port);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Starting API server on {}", addr);

    axum::serve(listener, router).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_origins_allowed() {
        assert!(is_local_origin(&HeaderValue::from_static("http://localhost:5173")));
        assert!(is_local_origin(&HeaderValue::from_static("http://127.0.0.1:3040")));
        assert!(!is_local_origin(&HeaderValue::from_static("https://evil.example")));
        assert!(!is_local_origin(&HeaderValue::from_static("http://localhost.evil.example")));
    }
}
