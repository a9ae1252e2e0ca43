use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::AppState;

/// Liveness plus a snapshot of pool occupancy.  Deliberately does not rent
/// a handle: under benchmark load a health probe must not compete with
/// real requests for pool capacity.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let pools = state.db.pool_stats();

    (
        StatusCode::OK,
        Json(json!({ "status": "healthy", "pools": pools })),
    )
}
