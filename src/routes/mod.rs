//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds the remote person methods, auth endpoints, and the graph view
//! surface (data, layout, and the WebSocket session) under a single Axum
//! router. The method route names mirror the original wire contract
//! (`person.insert`, `people.remove`).

pub mod auth;
pub mod graph;
pub mod people;
pub mod relationships;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/person.insert", post(people::insert))
        .route("/api/people.remove", post(people::remove))
        .route("/api/people", get(people::list))
        .route("/api/relationship.insert", post(relationships::insert))
        .route("/api/graph", get(graph::data))
        .route("/api/graph/layout", get(graph::layout))
        .route("/api/graph/ws", get(graph::handle_ws))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
