use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Routeur complet avec CORS permissif (client mobile) et traces HTTP.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/turnos", get(handlers::get_turnos))
        .route("/register_device", post(handlers::register_device))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
