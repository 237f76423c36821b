//! Payout request state machine.

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::LedgerError;
use crate::models::{
    ActorContext, Money, PayoutDecision, PayoutMethod, PayoutRequest, PayoutStatus,
};
use crate::services::balance::compute_balance;
use crate::services::commission::compute_split;
use crate::services::locks::VendorLocks;
use crate::services::metrics::PAYOUTS_TOTAL;
use crate::services::store::{LedgerStore, VendorRepository};

/// Business rules applied to payout requests.
#[derive(Debug, Clone)]
pub struct PayoutRules {
    pub currency: String,
    /// Smallest payout a vendor may request, in minor units.
    pub minimum_minor: i64,
    /// Optional processing fee taken out of each payout. Zero by default;
    /// the platform commission itself is collected at escrow release.
    pub fee_rate: Decimal,
}

#[derive(Clone)]
pub struct PayoutService {
    store: Arc<dyn LedgerStore>,
    vendors: Arc<dyn VendorRepository>,
    locks: VendorLocks,
    rules: PayoutRules,
}

impl PayoutService {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        vendors: Arc<dyn VendorRepository>,
        locks: VendorLocks,
        rules: PayoutRules,
    ) -> Self {
        Self {
            store,
            vendors,
            locks,
            rules,
        }
    }

    /// Create a payout request against the vendor's available balance.
    ///
    /// Runs entirely under the vendor's lock: the balance is recomputed
    /// after the lock is taken, and inserting the `Pending` request
    /// reserves the amount before the lock drops. Two concurrent requests
    /// can therefore never both spend the same funds.
    #[instrument(skip(self, amount), fields(vendor_id = %vendor_id, amount = %amount, method = %method))]
    pub async fn request_payout(
        &self,
        vendor_id: Uuid,
        amount: Money,
        method: PayoutMethod,
    ) -> Result<PayoutRequest, LedgerError> {
        let vendor = self
            .vendors
            .get_vendor(vendor_id)
            .await?
            .ok_or(LedgerError::VendorNotFound(vendor_id))?;

        let on_file = vendor
            .payout_method
            .ok_or(LedgerError::MissingPayoutMethod(vendor_id))?;
        if on_file.method() != method {
            return Err(LedgerError::MissingPayoutMethod(vendor_id));
        }

        if amount.minor_units <= 0 {
            return Err(LedgerError::NonPositiveAmount(amount));
        }

        let minimum = Money::new(self.rules.minimum_minor, self.rules.currency.clone());
        if amount.currency != minimum.currency {
            return Err(LedgerError::Money(crate::models::MoneyError::CurrencyMismatch {
                left: minimum.currency.clone(),
                right: amount.currency.clone(),
            }));
        }
        if amount.minor_units < minimum.minor_units {
            return Err(LedgerError::BelowMinimum {
                requested: amount,
                minimum,
            });
        }

        let _guard = self.locks.lock(vendor_id).await;

        let balance =
            compute_balance(self.store.as_ref(), vendor_id, &self.rules.currency).await?;
        if amount.minor_units > balance.available.minor_units {
            return Err(LedgerError::InsufficientBalance {
                requested: amount,
                available: balance.available,
            });
        }

        let split = compute_split(&amount, self.rules.fee_rate)?;
        let payout = PayoutRequest {
            payout_id: Uuid::new_v4(),
            vendor_id,
            requested_amount: amount,
            commission: split.commission,
            net_amount: split.net,
            status: PayoutStatus::Pending,
            method,
            created_utc: Utc::now(),
            resolved_utc: None,
        };
        self.store.insert_payout(&payout).await?;

        PAYOUTS_TOTAL.with_label_values(&["PENDING"]).inc();
        info!(
            payout_id = %payout.payout_id,
            requested = %payout.requested_amount,
            net = %payout.net_amount,
            "Payout requested"
        );
        Ok(payout)
    }

    /// Admin decision on a pending or processing request.
    ///
    /// APPROVE permanently debits the reserved amount; REJECT returns it to
    /// the available balance. Either way the request reaches a terminal
    /// state exactly once.
    #[instrument(skip(self, actor), fields(payout_id = %payout_id, actor_id = %actor.actor_id))]
    pub async fn resolve_payout(
        &self,
        payout_id: Uuid,
        decision: PayoutDecision,
        actor: &ActorContext,
    ) -> Result<PayoutRequest, LedgerError> {
        if !actor.is_admin() {
            return Err(LedgerError::Unauthorized(actor.actor_id));
        }

        let target = match decision {
            PayoutDecision::Approve => PayoutStatus::Completed,
            PayoutDecision::Reject => PayoutStatus::Rejected,
        };

        let payout = self
            .store
            .get_payout(payout_id)
            .await?
            .ok_or(LedgerError::PayoutNotFound(payout_id))?;

        let _guard = self.locks.lock(payout.vendor_id).await;

        self.transition(payout, target).await
    }

    /// Optional intermediate step an admin takes while the transfer is in
    /// flight externally.
    #[instrument(skip(self, actor), fields(payout_id = %payout_id, actor_id = %actor.actor_id))]
    pub async fn mark_processing(
        &self,
        payout_id: Uuid,
        actor: &ActorContext,
    ) -> Result<PayoutRequest, LedgerError> {
        if !actor.is_admin() {
            return Err(LedgerError::Unauthorized(actor.actor_id));
        }

        let payout = self
            .store
            .get_payout(payout_id)
            .await?
            .ok_or(LedgerError::PayoutNotFound(payout_id))?;

        let _guard = self.locks.lock(payout.vendor_id).await;

        self.transition(payout, PayoutStatus::Processing).await
    }

    /// A vendor may withdraw their own request while it is still pending.
    /// The reservation returns to the available balance.
    #[instrument(skip(self), fields(payout_id = %payout_id, vendor_id = %vendor_id))]
    pub async fn cancel_payout(
        &self,
        payout_id: Uuid,
        vendor_id: Uuid,
    ) -> Result<PayoutRequest, LedgerError> {
        let payout = self
            .store
            .get_payout(payout_id)
            .await?
            .ok_or(LedgerError::PayoutNotFound(payout_id))?;

        if payout.vendor_id != vendor_id {
            return Err(LedgerError::Unauthorized(vendor_id));
        }

        let _guard = self.locks.lock(payout.vendor_id).await;

        self.transition(payout, PayoutStatus::Cancelled).await
    }

    /// Apply one state-machine transition with a compare-and-swap, re-read
    /// under the vendor lock first so a stale snapshot cannot slip through.
    async fn transition(
        &self,
        payout: PayoutRequest,
        target: PayoutStatus,
    ) -> Result<PayoutRequest, LedgerError> {
        // Re-read: the status may have moved between fetch and lock.
        let mut payout = self
            .store
            .get_payout(payout.payout_id)
            .await?
            .ok_or(LedgerError::PayoutNotFound(payout.payout_id))?;

        if !payout.status.can_transition_to(target) {
            return Err(LedgerError::InvalidTransition {
                from: payout.status.to_string(),
                to: target.to_string(),
            });
        }

        let resolved_utc = target.is_terminal().then(Utc::now);
        let swapped = self
            .store
            .update_payout_status(payout.payout_id, payout.status, target, resolved_utc)
            .await?;
        if !swapped {
            let current = self
                .store
                .get_payout(payout.payout_id)
                .await?
                .map(|p| p.status.to_string())
                .unwrap_or_else(|| "UNKNOWN".to_string());
            return Err(LedgerError::InvalidTransition {
                from: current,
                to: target.to_string(),
            });
        }

        payout.status = target;
        payout.resolved_utc = resolved_utc;

        PAYOUTS_TOTAL.with_label_values(&[target.as_str()]).inc();
        info!(
            payout_id = %payout.payout_id,
            vendor_id = %payout.vendor_id,
            status = %target,
            "Payout transitioned"
        );
        Ok(payout)
    }

    pub async fn get_payout(&self, payout_id: Uuid) -> Result<PayoutRequest, LedgerError> {
        self.store
            .get_payout(payout_id)
            .await?
            .ok_or(LedgerError::PayoutNotFound(payout_id))
    }

    pub async fn payouts_for_vendor(
        &self,
        vendor_id: Uuid,
    ) -> Result<Vec<PayoutRequest>, LedgerError> {
        Ok(self.store.payouts_for_vendor(vendor_id).await?)
    }
}
