use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::AppState;
use super::handlers;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render))
        .route("/accounts/:id/statement", get(handlers::statement::show))
        .route("/accounts/:id/transactions", post(handlers::transactions::create))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
