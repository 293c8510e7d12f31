// src/routes.rs

use axum::{
    Json, Router,
    http::{HeaderValue, Method, header},
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{analytics, auth, lessons, progress},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Liveness stub.
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "message": "Arduino course API is running" }))
}

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, progress, lessons, analytics).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Pool + Config).
pub fn create_router(state: AppState) -> Router {
    let origin = state
        .config
        .frontend_origin
        .parse::<HeaderValue>()
        .unwrap();

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        // Protected profile route
        .merge(
            Router::new()
                .route("/me", get(auth::me))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    // The first segment is a user id for the listing and a lesson id for the
    // mutations, mirroring the frontend API client. The router template uses
    // one placeholder name for both; handlers extract positionally.
    let progress_routes = Router::new()
        .route("/{id}", get(progress::get_user_progress))
        .route("/{id}/activity", post(progress::complete_activity))
        .route("/{id}/quiz", post(progress::submit_quiz))
        .route("/{id}/code", post(progress::save_code_snapshot))
        .route("/{id}/video", post(progress::watch_video))
        .route("/{id}/complete", put(progress::mark_lesson_complete))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let lessons_routes = Router::new()
        .route("/", get(lessons::list_lessons))
        .route("/{day_id}", get(lessons::get_lesson));

    let analytics_routes = Router::new()
        .route("/{user_id}/overview", get(analytics::get_overview))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        .nest("/api/auth", auth_routes)
        .nest("/api/progress", progress_routes)
        .nest("/api/lessons", lessons_routes)
        .nest("/api/analytics", analytics_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
