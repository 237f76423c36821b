//! Storage abstraction for the ledger.
//!
//! Services receive these traits by injection, so the engine is decoupled
//! from any particular backend. `PgStore` backs production; `MemoryStore`
//! backs tests and the `memory` storage mode.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    LedgerEntry, Order, OrderStatus, PayoutMethodDetails, PayoutRequest, PayoutStatus, Vendor,
};

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn insert_order(&self, order: &Order) -> Result<(), StoreError>;

    async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>, StoreError>;

    /// Compare-and-swap on order status. Returns false when the current
    /// status no longer matches `from`, i.e. a concurrent writer won.
    async fn update_order_status(
        &self,
        order_id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, StoreError>;

    /// Append a batch of entries atomically: either all land or none do.
    /// Two constraints yield `StoreError::Conflict` and no writes: at most
    /// one entry per (order, type), and at most one closing entry (release
    /// or refund) per order.
    async fn append_entries(&self, entries: &[LedgerEntry]) -> Result<(), StoreError>;

    async fn entries_for_order(&self, order_id: Uuid) -> Result<Vec<LedgerEntry>, StoreError>;

    async fn entries_for_vendor(&self, vendor_id: Uuid) -> Result<Vec<LedgerEntry>, StoreError>;

    async fn insert_payout(&self, payout: &PayoutRequest) -> Result<(), StoreError>;

    async fn get_payout(&self, payout_id: Uuid) -> Result<Option<PayoutRequest>, StoreError>;

    /// Compare-and-swap on payout status. Returns false when the current
    /// status no longer matches `from`.
    async fn update_payout_status(
        &self,
        payout_id: Uuid,
        from: PayoutStatus,
        to: PayoutStatus,
        resolved_utc: Option<DateTime<Utc>>,
    ) -> Result<bool, StoreError>;

    async fn payouts_for_vendor(&self, vendor_id: Uuid)
        -> Result<Vec<PayoutRequest>, StoreError>;

    /// Total platform commission recorded, in minor units.
    async fn commission_total_minor(&self) -> Result<i64, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait VendorRepository: Send + Sync {
    async fn insert_vendor(&self, vendor: &Vendor) -> Result<(), StoreError>;

    async fn get_vendor(&self, vendor_id: Uuid) -> Result<Option<Vendor>, StoreError>;

    /// Returns false when the vendor does not exist.
    async fn set_payout_method(
        &self,
        vendor_id: Uuid,
        details: &PayoutMethodDetails,
    ) -> Result<bool, StoreError>;
}
