// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{questions, submission},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Mounts the form endpoints (catalog fetch, submission).
/// * Applies global middleware (Trace, CORS). The CORS layer answers
///   preflight OPTIONS requests itself with an empty body, the allow-list
///   origin, GET/POST and the Content-Type header.
/// * Injects global state (Airtable client + configuration).
pub fn create_router(state: AppState) -> Router {
    let origin = state
        .config
        .allowed_origin
        .parse::<HeaderValue>()
        .expect("ALLOWED_ORIGIN must be a valid header value");

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    let form_routes = Router::new()
        .route("/questions", get(questions::get_questions))
        .route("/submit", post(submission::submit_form));

    Router::new()
        .nest("/api/form", form_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
