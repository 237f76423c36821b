//! Vendor registry and vendor-scoped query handlers.

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::handlers::AppState;
use crate::models::{
    ActorContext, LedgerEntry, PayoutMethodDetails, PayoutRequest, Vendor, VendorBalance,
};
use service_core::error::AppError;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterVendorRequest {
    #[validate(length(min = 1, max = 255))]
    pub display_name: String,
    /// Optional payout destination supplied at onboarding time.
    pub payout_method: Option<PayoutMethodDetails>,
}

#[derive(Debug, Serialize)]
pub struct VendorResponse {
    pub vendor_id: Uuid,
    pub display_name: String,
    pub payout_method: Option<PayoutMethodDetails>,
    pub created_utc: DateTime<Utc>,
}

impl From<Vendor> for VendorResponse {
    fn from(vendor: Vendor) -> Self {
        Self {
            vendor_id: vendor.vendor_id,
            display_name: vendor.display_name,
            payout_method: vendor.payout_method,
            created_utc: vendor.created_utc,
        }
    }
}

/// Register a vendor with the ledger.
///
/// POST /vendors
pub async fn register_vendor(
    State(state): State<AppState>,
    Json(req): Json<RegisterVendorRequest>,
) -> Result<(StatusCode, Json<VendorResponse>), AppError> {
    req.validate()?;

    let vendor = Vendor {
        vendor_id: Uuid::new_v4(),
        display_name: req.display_name,
        payout_method: req.payout_method,
        created_utc: Utc::now(),
    };
    state
        .vendors
        .insert_vendor(&vendor)
        .await
        .map_err(crate::error::LedgerError::from)?;

    Ok((StatusCode::CREATED, Json(vendor.into())))
}

/// GET /vendors/:vendor_id
pub async fn get_vendor(
    State(state): State<AppState>,
    Path(vendor_id): Path<Uuid>,
) -> Result<Json<VendorResponse>, AppError> {
    let vendor = state
        .vendors
        .get_vendor(vendor_id)
        .await
        .map_err(crate::error::LedgerError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("vendor {} not found", vendor_id)))?;
    Ok(Json(vendor.into()))
}

/// Replace the payout destination on file.
///
/// PUT /vendors/:vendor_id/payout-method
pub async fn set_payout_method(
    State(state): State<AppState>,
    Path(vendor_id): Path<Uuid>,
    actor: ActorContext,
    Json(details): Json<PayoutMethodDetails>,
) -> Result<Json<VendorResponse>, AppError> {
    if !actor.is_admin() && actor.actor_id != vendor_id {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "actor {} may not modify vendor {}",
            actor.actor_id,
            vendor_id
        )));
    }

    let updated = state
        .vendors
        .set_payout_method(vendor_id, &details)
        .await
        .map_err(crate::error::LedgerError::from)?;
    if !updated {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "vendor {} not found",
            vendor_id
        )));
    }

    let vendor = state
        .vendors
        .get_vendor(vendor_id)
        .await
        .map_err(crate::error::LedgerError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("vendor {} not found", vendor_id)))?;
    Ok(Json(vendor.into()))
}

/// GET /vendors/:vendor_id/balance
pub async fn get_balance(
    State(state): State<AppState>,
    Path(vendor_id): Path<Uuid>,
) -> Result<Json<VendorBalance>, AppError> {
    let balance = state.balances.vendor_balance(vendor_id).await?;
    Ok(Json(balance))
}

/// GET /vendors/:vendor_id/entries
pub async fn list_entries(
    State(state): State<AppState>,
    Path(vendor_id): Path<Uuid>,
) -> Result<Json<Vec<LedgerEntry>>, AppError> {
    let entries = state.escrow.entries_for_vendor(vendor_id).await?;
    Ok(Json(entries))
}

/// GET /vendors/:vendor_id/payouts
pub async fn list_payouts(
    State(state): State<AppState>,
    Path(vendor_id): Path<Uuid>,
) -> Result<Json<Vec<PayoutRequest>>, AppError> {
    let payouts = state.payouts.payouts_for_vendor(vendor_id).await?;
    Ok(Json(payouts))
}
