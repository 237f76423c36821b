//! Append-only escrow ledger entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::money::Money;

/// Kind of ledger entry.
///
/// `Commission` records the platform's cut at release time; it is platform
/// revenue and never counts toward a vendor's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryType {
    EscrowHold,
    EscrowRelease,
    EscrowRefund,
    Commission,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EscrowHold => "ESCROW_HOLD",
            Self::EscrowRelease => "ESCROW_RELEASE",
            Self::EscrowRefund => "ESCROW_REFUND",
            Self::Commission => "COMMISSION",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ESCROW_HOLD" => Some(Self::EscrowHold),
            "ESCROW_RELEASE" => Some(Self::EscrowRelease),
            "ESCROW_REFUND" => Some(Self::EscrowRefund),
            "COMMISSION" => Some(Self::Commission),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Single immutable ledger entry.
///
/// Entries are never updated or deleted. Corrections append offsetting
/// entries instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub entry_id: Uuid,
    pub order_id: Uuid,
    pub vendor_id: Uuid,
    pub entry_type: EntryType,
    pub amount: Money,
    pub created_utc: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(order_id: Uuid, vendor_id: Uuid, entry_type: EntryType, amount: Money) -> Self {
        Self {
            entry_id: Uuid::new_v4(),
            order_id,
            vendor_id,
            entry_type,
            amount,
            created_utc: Utc::now(),
        }
    }
}
