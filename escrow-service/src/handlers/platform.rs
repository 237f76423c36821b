//! Platform finance handlers.

use axum::extract::{Json, State};
use serde::Serialize;

use crate::handlers::AppState;
use crate::models::{ActorContext, Money};
use service_core::error::AppError;

#[derive(Debug, Serialize)]
pub struct RevenueResponse {
    pub total_commission: Money,
}

/// Total commission collected across all vendors.
///
/// GET /platform/revenue
pub async fn get_revenue(
    State(state): State<AppState>,
    actor: ActorContext,
) -> Result<Json<RevenueResponse>, AppError> {
    if !actor.is_admin() {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "actor {} may not view platform revenue",
            actor.actor_id
        )));
    }

    let total_commission = state.balances.platform_revenue().await?;
    Ok(Json(RevenueResponse { total_commission }))
}
