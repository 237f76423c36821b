//! Balance aggregator: a pure read-side projection over the ledger.

use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::LedgerError;
use crate::models::{EntryType, Money, VendorBalance};
use crate::services::store::LedgerStore;

/// Replay a vendor's ledger entries and payout history into a balance.
///
/// Always recomputed from the authoritative log; there is no cached
/// counter anywhere that could drift.
pub async fn compute_balance(
    store: &dyn LedgerStore,
    vendor_id: Uuid,
    currency: &str,
) -> Result<VendorBalance, LedgerError> {
    let entries = store.entries_for_vendor(vendor_id).await?;
    let payouts = store.payouts_for_vendor(vendor_id).await?;

    let mut held = Money::zero(currency);
    let mut released = Money::zero(currency);
    let mut refunded = Money::zero(currency);

    for entry in &entries {
        match entry.entry_type {
            EntryType::EscrowHold => held = held.add(&entry.amount)?,
            EntryType::EscrowRelease => released = released.add(&entry.amount)?,
            EntryType::EscrowRefund => refunded = refunded.add(&entry.amount)?,
            // Platform revenue, not vendor money.
            EntryType::Commission => {}
        }
    }

    let mut paid_out = Money::zero(currency);
    let mut reserved = Money::zero(currency);

    for payout in &payouts {
        if payout.status.reserves_funds() {
            reserved = reserved.add(&payout.requested_amount)?;
        } else if payout.status == crate::models::PayoutStatus::Completed {
            paid_out = paid_out.add(&payout.requested_amount)?;
        }
    }

    // Releases record the vendor's net; the commission accrues to the
    // platform at the same instant, so held amounts drain by net + fee.
    let commission: Money = entries
        .iter()
        .filter(|e| e.entry_type == EntryType::Commission)
        .try_fold(Money::zero(currency), |acc, e| acc.add(&e.amount))?;

    let pending_escrow = held
        .checked_sub(&released)?
        .checked_sub(&refunded)?
        .checked_sub(&commission)?;

    let available = released.checked_sub(&paid_out)?.checked_sub(&reserved)?;

    Ok(VendorBalance {
        available,
        pending_escrow,
        total_paid_out: paid_out,
        reserved,
    })
}

/// Read-side balance queries for handlers.
#[derive(Clone)]
pub struct BalanceService {
    store: Arc<dyn LedgerStore>,
    currency: String,
}

impl BalanceService {
    pub fn new(store: Arc<dyn LedgerStore>, currency: String) -> Self {
        Self { store, currency }
    }

    #[instrument(skip(self), fields(vendor_id = %vendor_id))]
    pub async fn vendor_balance(&self, vendor_id: Uuid) -> Result<VendorBalance, LedgerError> {
        compute_balance(self.store.as_ref(), vendor_id, &self.currency).await
    }

    /// Total commission the platform has collected, across all vendors.
    #[instrument(skip(self))]
    pub async fn platform_revenue(&self) -> Result<Money, LedgerError> {
        let total = self.store.commission_total_minor().await?;
        Ok(Money::new(total, self.currency.clone()))
    }
}
