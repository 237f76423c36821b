//! HTTP handlers for the escrow and payout API.

pub mod escrow;
pub mod orders;
pub mod payouts;
pub mod platform;
pub mod vendors;

use axum::{
    Router,
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    routing::{get, post, put},
};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::EscrowConfig;
use crate::models::{ActorContext, ActorRole};
use crate::services::{
    BalanceService, EscrowService, LedgerStore, OrderService, PayoutService, VendorRepository,
};
use service_core::error::AppError;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: EscrowConfig,
    pub store: Arc<dyn LedgerStore>,
    pub vendors: Arc<dyn VendorRepository>,
    pub orders: OrderService,
    pub escrow: EscrowService,
    pub payouts: PayoutService,
    pub balances: BalanceService,
}

/// Extract the calling actor from gateway-forwarded headers.
///
/// The upstream gateway authenticates the session and forwards the
/// resolved identity; requests arriving without it are rejected.
#[async_trait]
impl<S> FromRequestParts<S> for ActorContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor_id = parts
            .headers
            .get(ACTOR_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| {
                AppError::Unauthorized(anyhow::anyhow!("missing or invalid {}", ACTOR_ID_HEADER))
            })?;

        let role = parts
            .headers
            .get(ACTOR_ROLE_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(ActorRole::parse)
            .ok_or_else(|| {
                AppError::Unauthorized(anyhow::anyhow!("missing or invalid {}", ACTOR_ROLE_HEADER))
            })?;

        Ok(ActorContext { actor_id, role })
    }
}

/// Routes for the command/query interface.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/vendors", post(vendors::register_vendor))
        .route("/vendors/:vendor_id", get(vendors::get_vendor))
        .route(
            "/vendors/:vendor_id/payout-method",
            put(vendors::set_payout_method),
        )
        .route("/vendors/:vendor_id/balance", get(vendors::get_balance))
        .route("/vendors/:vendor_id/entries", get(vendors::list_entries))
        .route("/vendors/:vendor_id/payouts", get(vendors::list_payouts))
        .route("/orders", post(orders::create_order))
        .route("/orders/:order_id", get(orders::get_order))
        .route("/orders/:order_id/status", post(orders::advance_status))
        .route("/orders/:order_id/entries", get(orders::list_entries))
        .route("/escrow/holds", post(escrow::create_hold))
        .route("/escrow/holds/:order_id/release", post(escrow::release_hold))
        .route("/escrow/holds/:order_id/refund", post(escrow::refund_hold))
        .route("/payouts", post(payouts::request_payout))
        .route("/payouts/:payout_id", get(payouts::get_payout))
        .route("/payouts/:payout_id/resolve", post(payouts::resolve_payout))
        .route(
            "/payouts/:payout_id/processing",
            post(payouts::mark_processing),
        )
        .route("/payouts/:payout_id/cancel", post(payouts::cancel_payout))
        .route("/platform/revenue", get(platform::get_revenue))
}
