// src/routes.rs

use axum::{
    Router,
    http::Method,
    routing::{delete, get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{admin, problems, users},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (users, admin, problems).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Database Pool + Config).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    let user_routes = Router::new()
        .route("/login", post(users::login))
        .route("/", get(users::list_users))
        .route("/{id}", get(users::get_user).put(users::rename_user));

    let admin_routes = Router::new().route("/auth", post(admin::authenticate));

    let problem_routes = Router::new()
        .route(
            "/",
            get(problems::list_problems).post(problems::create_problem),
        )
        .route("/{date}", delete(problems::delete_problem))
        .route("/{date}/solve", post(problems::submit_answer));

    Router::new()
        .nest("/api/users", user_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api/problems", problem_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
