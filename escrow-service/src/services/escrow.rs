//! Escrow ledger operations: hold, release, refund.

use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{LedgerError, StoreError};
use crate::models::{EntryType, LedgerEntry, Money, Order, OrderStatus};
use crate::services::commission::{Split, compute_split};
use crate::services::locks::VendorLocks;
use crate::services::metrics::LEDGER_ENTRIES_TOTAL;
use crate::services::store::LedgerStore;

#[derive(Clone)]
pub struct EscrowService {
    store: Arc<dyn LedgerStore>,
    locks: VendorLocks,
}

impl EscrowService {
    pub fn new(store: Arc<dyn LedgerStore>, locks: VendorLocks) -> Self {
        Self { store, locks }
    }

    async fn order_entries(
        &self,
        order_id: Uuid,
    ) -> Result<(Option<LedgerEntry>, bool), LedgerError> {
        let entries = self.store.entries_for_order(order_id).await?;
        let hold = entries
            .iter()
            .find(|e| e.entry_type == EntryType::EscrowHold)
            .cloned();
        let closed = entries.iter().any(|e| {
            matches!(
                e.entry_type,
                EntryType::EscrowRelease | EntryType::EscrowRefund
            )
        });
        Ok((hold, closed))
    }

    /// Earmark the gross amount of an order in escrow.
    ///
    /// At most one hold may ever exist per order; a second call fails with
    /// `DuplicateHold` instead of double-applying.
    #[instrument(skip(self, amount), fields(order_id = %order_id, vendor_id = %vendor_id, amount = %amount))]
    pub async fn create_hold(
        &self,
        order_id: Uuid,
        vendor_id: Uuid,
        amount: Money,
    ) -> Result<LedgerEntry, LedgerError> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(LedgerError::OrderNotFound(order_id))?;

        if order.vendor_id != vendor_id {
            return Err(LedgerError::VendorMismatch {
                order_id,
                expected: order.vendor_id,
                got: vendor_id,
            });
        }
        if amount.minor_units <= 0 {
            return Err(LedgerError::NonPositiveAmount(amount));
        }
        if amount.currency != order.gross_amount.currency {
            return Err(LedgerError::Money(crate::models::MoneyError::CurrencyMismatch {
                left: order.gross_amount.currency.clone(),
                right: amount.currency.clone(),
            }));
        }

        let (hold, _) = self.order_entries(order_id).await?;
        if hold.is_some() {
            return Err(LedgerError::DuplicateHold(order_id));
        }

        let entry = LedgerEntry::new(order_id, vendor_id, EntryType::EscrowHold, amount);
        match self.store.append_entries(std::slice::from_ref(&entry)).await {
            Ok(()) => {}
            // Two concurrent holds for one order: the unique constraint
            // catches whichever lost the race.
            Err(StoreError::Conflict(_)) => return Err(LedgerError::DuplicateHold(order_id)),
            Err(e) => return Err(e.into()),
        }

        LEDGER_ENTRIES_TOTAL
            .with_label_values(&["ESCROW_HOLD"])
            .inc();
        info!(entry_id = %entry.entry_id, "Escrow hold created");
        Ok(entry)
    }

    /// Release a completed order's hold: credit the vendor's net and record
    /// the platform commission.
    ///
    /// Idempotent in the failure direction: a second call reports
    /// `AlreadyClosed` and appends nothing.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn release_hold(&self, order_id: Uuid) -> Result<Split, LedgerError> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(LedgerError::OrderNotFound(order_id))?;

        // Releasing credits the vendor's available balance, so it runs under
        // the vendor's lock like every other balance-affecting mutation.
        let _guard = self.locks.lock(order.vendor_id).await;

        let (hold, closed) = self.order_entries(order_id).await?;
        let hold = hold.ok_or(LedgerError::NoActiveHold(order_id))?;
        if closed {
            return Err(LedgerError::AlreadyClosed(order_id));
        }
        if order.status != OrderStatus::Completed {
            return Err(LedgerError::OrderNotCompleted {
                order_id,
                status: order.status,
            });
        }

        // Split from the held amount using the rate snapshotted on the order.
        let split = compute_split(&hold.amount, order.platform_fee_rate)?;

        let release = LedgerEntry::new(
            order_id,
            order.vendor_id,
            EntryType::EscrowRelease,
            split.net.clone(),
        );
        let commission = LedgerEntry::new(
            order_id,
            order.vendor_id,
            EntryType::Commission,
            split.commission.clone(),
        );

        match self.store.append_entries(&[release, commission]).await {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => return Err(LedgerError::AlreadyClosed(order_id)),
            Err(e) => return Err(e.into()),
        }

        LEDGER_ENTRIES_TOTAL
            .with_label_values(&["ESCROW_RELEASE"])
            .inc();
        LEDGER_ENTRIES_TOTAL
            .with_label_values(&["COMMISSION"])
            .inc();
        info!(
            vendor_id = %order.vendor_id,
            net = %split.net,
            commission = %split.commission,
            "Escrow released"
        );
        Ok(split)
    }

    /// Refund an order's hold back toward the customer, closing it.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn refund_hold(&self, order_id: Uuid) -> Result<LedgerEntry, LedgerError> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(LedgerError::OrderNotFound(order_id))?;

        // Refunds close the hold the same way releases do, so they contend
        // for the same vendor lock; a racing release and refund serialize
        // here and the loser sees the hold as closed.
        let _guard = self.locks.lock(order.vendor_id).await;

        let (hold, closed) = self.order_entries(order_id).await?;
        let hold = hold.ok_or(LedgerError::NoActiveHold(order_id))?;
        if closed {
            return Err(LedgerError::AlreadyClosed(order_id));
        }

        let entry = LedgerEntry::new(
            order_id,
            order.vendor_id,
            EntryType::EscrowRefund,
            hold.amount.clone(),
        );
        match self.store.append_entries(std::slice::from_ref(&entry)).await {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => return Err(LedgerError::AlreadyClosed(order_id)),
            Err(e) => return Err(e.into()),
        }

        LEDGER_ENTRIES_TOTAL
            .with_label_values(&["ESCROW_REFUND"])
            .inc();
        info!(entry_id = %entry.entry_id, amount = %entry.amount, "Escrow refunded");
        Ok(entry)
    }

    /// Ledger entries for one order, oldest first.
    pub async fn entries_for_order(&self, order_id: Uuid) -> Result<Vec<LedgerEntry>, LedgerError> {
        let order = self.store.get_order(order_id).await?;
        if order.is_none() {
            return Err(LedgerError::OrderNotFound(order_id));
        }
        Ok(self.store.entries_for_order(order_id).await?)
    }

    /// Ledger entries for one vendor, oldest first.
    pub async fn entries_for_vendor(
        &self,
        vendor_id: Uuid,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        Ok(self.store.entries_for_vendor(vendor_id).await?)
    }

    pub async fn get_order(&self, order_id: Uuid) -> Result<Order, LedgerError> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or(LedgerError::OrderNotFound(order_id))
    }
}
