// src/routes.rs

use axum::{
    Json, Router,
    http::Method,
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{chat, quiz, speech},
    state::AppState,
    utils::auth::auth_middleware,
};

/// Assembles the main application router.
///
/// * Everything under /api/user requires the identity header.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (pool, config, collaborator clients).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderName::from_static(crate::utils::auth::USER_ID_HEADER),
        ]);

    let user_routes = Router::new()
        .route("/questions/start", post(quiz::start_questions))
        .route("/questions/end", post(quiz::end_questions))
        .route("/leaderboard/{subject}/{difficulty}", get(quiz::get_leaderboard))
        .route("/messages", get(chat::list_messages))
        .route("/messages/create", post(chat::create_message))
        .route("/speech", post(speech::synthesize))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/api", get(health))
        .nest("/api/user", user_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "ok" }))
}
