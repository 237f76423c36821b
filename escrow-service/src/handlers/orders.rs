//! Order record handlers.

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::handlers::AppState;
use crate::models::{LedgerEntry, Money, Order, OrderStatus};
use service_core::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub vendor_id: Uuid,
    pub customer_id: Uuid,
    pub gross_amount: Money,
    pub deposit_amount: Money,
    /// Overrides the platform default; snapshotted onto the order.
    pub platform_fee_rate: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct AdvanceStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order_id: Uuid,
    pub vendor_id: Uuid,
    pub customer_id: Uuid,
    pub gross_amount: Money,
    pub deposit_amount: Money,
    pub platform_fee_rate: Decimal,
    pub status: OrderStatus,
    pub created_utc: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            order_id: order.order_id,
            vendor_id: order.vendor_id,
            customer_id: order.customer_id,
            gross_amount: order.gross_amount,
            deposit_amount: order.deposit_amount,
            platform_fee_rate: order.platform_fee_rate,
            status: order.status,
            created_utc: order.created_utc,
        }
    }
}

/// Record a confirmed checkout.
///
/// POST /orders
pub async fn create_order(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    let order = state
        .orders
        .create_order(
            req.vendor_id,
            req.customer_id,
            req.gross_amount,
            req.deposit_amount,
            req.platform_fee_rate,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /orders/:order_id
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = state.orders.get_order(order_id).await?;
    Ok(Json(order.into()))
}

/// Advance fulfillment status.
///
/// POST /orders/:order_id/status
pub async fn advance_status(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(req): Json<AdvanceStatusRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = state.orders.advance_status(order_id, req.status).await?;
    Ok(Json(order.into()))
}

/// GET /orders/:order_id/entries
pub async fn list_entries(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Vec<LedgerEntry>>, AppError> {
    let entries = state.escrow.entries_for_order(order_id).await?;
    Ok(Json(entries))
}
