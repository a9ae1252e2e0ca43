use axum::extract::{Path, State};
use axum::Json;

use crate::errors::AppError;
use crate::models::AccountStatement;
use crate::AppState;

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<AccountStatement>, AppError> {
    match state.db.account_statement(id).await? {
        Some(statement) => Ok(Json(statement)),
        None => Err(AppError::NotFound),
    }
}
