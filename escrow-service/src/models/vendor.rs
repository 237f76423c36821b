//! Vendor registry models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::payout::PayoutMethod;

/// Payout destination details a vendor keeps on file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutMethodDetails {
    BankTransfer {
        account_name: String,
        account_number: String,
        ifsc: String,
    },
    Paypal {
        email: String,
    },
}

impl PayoutMethodDetails {
    pub fn method(&self) -> PayoutMethod {
        match self {
            Self::BankTransfer { .. } => PayoutMethod::BankTransfer,
            Self::Paypal { .. } => PayoutMethod::Paypal,
        }
    }
}

/// A marketplace vendor as seen by the ledger.
///
/// Deliberately narrow: the ledger only needs an identity and a payout
/// destination, not the storefront profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vendor {
    pub vendor_id: Uuid,
    pub display_name: String,
    pub payout_method: Option<PayoutMethodDetails>,
    pub created_utc: DateTime<Utc>,
}
