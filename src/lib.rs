//! Realtime relay for collaborative proposal editing.
//!
//! Editors of the same document connect to `/ws/docs/:document_id` and every
//! frame one of them sends is fanned out to the others, together with
//! join/leave presence events. The relay keeps no history and never looks
//! past a frame's `type` field.

pub mod config;
pub mod docs;
pub mod handlers;
pub mod models;
pub mod room;
pub mod routes;
pub mod state;
pub mod websocket;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use docs::ApiDoc;
use routes::{cors_layer, create_api_routes};
use state::AppState;

/// Build the full router around `state`.
pub fn build_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(handlers::root))
        .route("/ws/docs/:document_id", get(websocket::websocket_handler))
        // Mount API routes
        .nest("/api", create_api_routes())
        .fallback(handlers::not_found)
        .with_state(state)
        // Mount Swagger UI
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        // Add tracing layer
        .layer(TraceLayer::new_for_http())
}
