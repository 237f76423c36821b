//! In-memory storage backend.
//!
//! A single `RwLock` over the whole state keeps every mutation atomic,
//! including batch appends with their constraint checks. Used by tests and
//! the `memory` storage mode for local development.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    EntryType, LedgerEntry, Order, OrderStatus, PayoutMethodDetails, PayoutRequest, PayoutStatus,
    Vendor,
};
use crate::services::store::{LedgerStore, VendorRepository};

#[derive(Default)]
struct State {
    orders: HashMap<Uuid, Order>,
    entries: Vec<LedgerEntry>,
    payouts: HashMap<Uuid, PayoutRequest>,
    vendors: HashMap<Uuid, Vendor>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn insert_order(&self, order: &Order) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if state.orders.contains_key(&order.order_id) {
            return Err(StoreError::Conflict(format!(
                "order {} already exists",
                order.order_id
            )));
        }
        state.orders.insert(order.order_id, order.clone());
        Ok(())
    }

    async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self.state.read().await.orders.get(&order_id).cloned())
    }

    async fn update_order_status(
        &self,
        order_id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        match state.orders.get_mut(&order_id) {
            Some(order) if order.status == from => {
                order.status = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn append_entries(&self, entries: &[LedgerEntry]) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        // One entry per (order, type), and one closure (release or refund)
        // per order: checked before anything is appended so a rejected
        // batch leaves no trace.
        let closes = |t: EntryType| {
            matches!(t, EntryType::EscrowRelease | EntryType::EscrowRefund)
        };
        for entry in entries {
            let duplicate = state
                .entries
                .iter()
                .any(|e| e.order_id == entry.order_id && e.entry_type == entry.entry_type);
            if duplicate {
                return Err(StoreError::Conflict(format!(
                    "entry of type {} already exists for order {}",
                    entry.entry_type, entry.order_id
                )));
            }
            if closes(entry.entry_type) {
                let already_closed = state
                    .entries
                    .iter()
                    .any(|e| e.order_id == entry.order_id && closes(e.entry_type));
                if already_closed {
                    return Err(StoreError::Conflict(format!(
                        "order {} already has a closing entry",
                        entry.order_id
                    )));
                }
            }
        }
        state.entries.extend_from_slice(entries);
        Ok(())
    }

    async fn entries_for_order(&self, order_id: Uuid) -> Result<Vec<LedgerEntry>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .entries
            .iter()
            .filter(|e| e.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn entries_for_vendor(&self, vendor_id: Uuid) -> Result<Vec<LedgerEntry>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .entries
            .iter()
            .filter(|e| e.vendor_id == vendor_id)
            .cloned()
            .collect())
    }

    async fn insert_payout(&self, payout: &PayoutRequest) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if state.payouts.contains_key(&payout.payout_id) {
            return Err(StoreError::Conflict(format!(
                "payout {} already exists",
                payout.payout_id
            )));
        }
        state.payouts.insert(payout.payout_id, payout.clone());
        Ok(())
    }

    async fn get_payout(&self, payout_id: Uuid) -> Result<Option<PayoutRequest>, StoreError> {
        Ok(self.state.read().await.payouts.get(&payout_id).cloned())
    }

    async fn update_payout_status(
        &self,
        payout_id: Uuid,
        from: PayoutStatus,
        to: PayoutStatus,
        resolved_utc: Option<DateTime<Utc>>,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        match state.payouts.get_mut(&payout_id) {
            Some(payout) if payout.status == from => {
                payout.status = to;
                payout.resolved_utc = resolved_utc;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn payouts_for_vendor(
        &self,
        vendor_id: Uuid,
    ) -> Result<Vec<PayoutRequest>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .payouts
            .values()
            .filter(|p| p.vendor_id == vendor_id)
            .cloned()
            .collect())
    }

    async fn commission_total_minor(&self) -> Result<i64, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .entries
            .iter()
            .filter(|e| e.entry_type == EntryType::Commission)
            .map(|e| e.amount.minor_units)
            .sum())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl VendorRepository for MemoryStore {
    async fn insert_vendor(&self, vendor: &Vendor) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if state.vendors.contains_key(&vendor.vendor_id) {
            return Err(StoreError::Conflict(format!(
                "vendor {} already exists",
                vendor.vendor_id
            )));
        }
        state.vendors.insert(vendor.vendor_id, vendor.clone());
        Ok(())
    }

    async fn get_vendor(&self, vendor_id: Uuid) -> Result<Option<Vendor>, StoreError> {
        Ok(self.state.read().await.vendors.get(&vendor_id).cloned())
    }

    async fn set_payout_method(
        &self,
        vendor_id: Uuid,
        details: &PayoutMethodDetails,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        match state.vendors.get_mut(&vendor_id) {
            Some(vendor) => {
                vendor.payout_method = Some(details.clone());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
