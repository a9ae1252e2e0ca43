use axum::extract::{Path, State};
use axum::Json;

use crate::errors::AppError;
use crate::models::{TransactionOutcome, TransactionReceipt, TransactionRequest};
use crate::AppState;

const MAX_DESCRIPTION_LEN: usize = 10;

pub async fn create(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(req): Json<TransactionRequest>,
) -> Result<Json<TransactionReceipt>, AppError> {
    if req.amount < 1 {
        return Err(AppError::Unprocessable("amount must be positive".into()));
    }
    if req.description.is_empty() || req.description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(AppError::Unprocessable(
            "description must be 1 to 10 characters".into(),
        ));
    }

    match state.db.create_transaction(id, &req).await? {
        TransactionOutcome::Accepted(receipt) => Ok(Json(receipt)),
        TransactionOutcome::Rejected => {
            Err(AppError::Unprocessable("insufficient funds".into()))
        }
        TransactionOutcome::UnknownAccount => Err(AppError::NotFound),
    }
}
