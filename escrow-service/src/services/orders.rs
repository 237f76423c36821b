//! Order record creation and fulfillment transitions.

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::LedgerError;
use crate::models::{Money, Order, OrderStatus};
use crate::services::store::{LedgerStore, VendorRepository};

#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn LedgerStore>,
    vendors: Arc<dyn VendorRepository>,
    /// Platform fee rate snapshotted onto orders created without an
    /// explicit override.
    default_fee_rate: Decimal,
}

impl OrderService {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        vendors: Arc<dyn VendorRepository>,
        default_fee_rate: Decimal,
    ) -> Self {
        Self {
            store,
            vendors,
            default_fee_rate,
        }
    }

    /// Record a confirmed checkout as an order, snapshotting the platform
    /// fee rate so later rate changes never touch this order.
    #[instrument(skip(self, gross_amount, deposit_amount), fields(vendor_id = %vendor_id, customer_id = %customer_id))]
    pub async fn create_order(
        &self,
        vendor_id: Uuid,
        customer_id: Uuid,
        gross_amount: Money,
        deposit_amount: Money,
        fee_rate: Option<Decimal>,
    ) -> Result<Order, LedgerError> {
        if self.vendors.get_vendor(vendor_id).await?.is_none() {
            return Err(LedgerError::VendorNotFound(vendor_id));
        }
        if gross_amount.minor_units <= 0 {
            return Err(LedgerError::NonPositiveAmount(gross_amount));
        }
        // Deposit shares the order currency; a mismatch is caller error.
        gross_amount.add(&deposit_amount)?;

        let platform_fee_rate = fee_rate.unwrap_or(self.default_fee_rate);
        if platform_fee_rate < Decimal::ZERO || platform_fee_rate > Decimal::ONE {
            return Err(crate::models::MoneyError::InvalidRate(platform_fee_rate).into());
        }

        let order = Order {
            order_id: Uuid::new_v4(),
            vendor_id,
            customer_id,
            gross_amount,
            deposit_amount,
            platform_fee_rate,
            status: OrderStatus::Pending,
            created_utc: Utc::now(),
        };
        self.store.insert_order(&order).await?;

        info!(
            order_id = %order.order_id,
            gross = %order.gross_amount,
            fee_rate = %order.platform_fee_rate,
            "Order created"
        );
        Ok(order)
    }

    /// Advance an order through its fulfillment lifecycle.
    #[instrument(skip(self), fields(order_id = %order_id, to = %to))]
    pub async fn advance_status(
        &self,
        order_id: Uuid,
        to: OrderStatus,
    ) -> Result<Order, LedgerError> {
        let mut order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(LedgerError::OrderNotFound(order_id))?;

        if !order.status.can_transition_to(to) {
            return Err(LedgerError::InvalidTransition {
                from: order.status.to_string(),
                to: to.to_string(),
            });
        }

        let swapped = self
            .store
            .update_order_status(order_id, order.status, to)
            .await?;
        if !swapped {
            let current = self
                .store
                .get_order(order_id)
                .await?
                .map(|o| o.status.to_string())
                .unwrap_or_else(|| "UNKNOWN".to_string());
            return Err(LedgerError::InvalidTransition {
                from: current,
                to: to.to_string(),
            });
        }

        order.status = to;
        info!(order_id = %order.order_id, status = %to, "Order status advanced");
        Ok(order)
    }

    pub async fn get_order(&self, order_id: Uuid) -> Result<Order, LedgerError> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or(LedgerError::OrderNotFound(order_id))
    }
}
