//! Escrow hold/release/refund handlers.

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::handlers::AppState;
use crate::models::{LedgerEntry, Money};
use service_core::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CreateHoldRequest {
    pub order_id: Uuid,
    pub vendor_id: Uuid,
    pub amount: Money,
}

#[derive(Debug, Serialize)]
pub struct SplitResponse {
    pub commission: Money,
    pub net: Money,
}

/// Earmark an order's gross amount in escrow.
///
/// POST /escrow/holds
pub async fn create_hold(
    State(state): State<AppState>,
    Json(req): Json<CreateHoldRequest>,
) -> Result<(StatusCode, Json<LedgerEntry>), AppError> {
    let entry = state
        .escrow
        .create_hold(req.order_id, req.vendor_id, req.amount)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Release a completed order's hold to the vendor.
///
/// POST /escrow/holds/:order_id/release
pub async fn release_hold(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<SplitResponse>, AppError> {
    let split = state.escrow.release_hold(order_id).await?;
    Ok(Json(SplitResponse {
        commission: split.commission,
        net: split.net,
    }))
}

/// Refund an order's hold toward the customer.
///
/// POST /escrow/holds/:order_id/refund
pub async fn refund_hold(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<LedgerEntry>, AppError> {
    let entry = state.escrow.refund_hold(order_id).await?;
    Ok(Json(entry))
}
