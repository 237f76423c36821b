//! Derived vendor balance projection.

use serde::{Deserialize, Serialize};

use super::money::Money;

/// A vendor's balance, derived by replaying ledger and payout history.
///
/// Never stored: there is no mutable balance counter anywhere that could
/// drift from the log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorBalance {
    /// Released funds not yet withdrawn or reserved by an open payout.
    pub available: Money,
    /// Funds still held in escrow for in-flight orders.
    pub pending_escrow: Money,
    /// Sum of all completed payouts.
    pub total_paid_out: Money,
    /// Funds reserved by pending/processing payout requests.
    pub reserved: Money,
}
