//! Payout request handlers.

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::handlers::AppState;
use crate::models::{ActorContext, Money, PayoutDecision, PayoutMethod, PayoutRequest};
use service_core::error::AppError;

#[derive(Debug, Deserialize)]
pub struct RequestPayoutRequest {
    pub vendor_id: Uuid,
    pub amount: Money,
    pub method: PayoutMethod,
}

#[derive(Debug, Deserialize)]
pub struct ResolvePayoutRequest {
    pub decision: PayoutDecision,
}

/// A vendor withdraws from their available balance.
///
/// POST /payouts
pub async fn request_payout(
    State(state): State<AppState>,
    actor: ActorContext,
    Json(req): Json<RequestPayoutRequest>,
) -> Result<(StatusCode, Json<PayoutRequest>), AppError> {
    if !actor.is_admin() && actor.actor_id != req.vendor_id {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "actor {} may not request payouts for vendor {}",
            actor.actor_id,
            req.vendor_id
        )));
    }

    let payout = state
        .payouts
        .request_payout(req.vendor_id, req.amount, req.method)
        .await?;
    Ok((StatusCode::CREATED, Json(payout)))
}

/// GET /payouts/:payout_id
pub async fn get_payout(
    State(state): State<AppState>,
    Path(payout_id): Path<Uuid>,
) -> Result<Json<PayoutRequest>, AppError> {
    let payout = state.payouts.get_payout(payout_id).await?;
    Ok(Json(payout))
}

/// Admin approves or rejects a payout.
///
/// POST /payouts/:payout_id/resolve
pub async fn resolve_payout(
    State(state): State<AppState>,
    Path(payout_id): Path<Uuid>,
    actor: ActorContext,
    Json(req): Json<ResolvePayoutRequest>,
) -> Result<Json<PayoutRequest>, AppError> {
    let payout = state
        .payouts
        .resolve_payout(payout_id, req.decision, &actor)
        .await?;
    Ok(Json(payout))
}

/// Admin marks a payout as in flight with the payment rail.
///
/// POST /payouts/:payout_id/processing
pub async fn mark_processing(
    State(state): State<AppState>,
    Path(payout_id): Path<Uuid>,
    actor: ActorContext,
) -> Result<Json<PayoutRequest>, AppError> {
    let payout = state.payouts.mark_processing(payout_id, &actor).await?;
    Ok(Json(payout))
}

/// The requesting vendor cancels a still-pending payout.
///
/// POST /payouts/:payout_id/cancel
pub async fn cancel_payout(
    State(state): State<AppState>,
    Path(payout_id): Path<Uuid>,
    actor: ActorContext,
) -> Result<Json<PayoutRequest>, AppError> {
    let payout = state
        .payouts
        .cancel_payout(payout_id, actor.actor_id)
        .await?;
    Ok(Json(payout))
}
