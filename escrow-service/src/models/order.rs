//! Rental order record with its fulfillment state machine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::money::Money;

/// Fulfillment status of a rental order.
///
/// Allowed transitions are enforced here and nowhere else. Only a
/// `Completed` order may trigger an escrow release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Active,
    Delivered,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether a transition to `next` is permitted.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Pending, Confirmed)
            | (Confirmed, Active)
            | (Active, Delivered)
            | (Delivered, Completed) => true,
            (Pending | Confirmed | Active | Delivered, Cancelled) => true,
            _ => false,
        }
    }

    /// String representation for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Active => "ACTIVE",
            Self::Delivered => "DELIVERED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "CONFIRMED" => Some(Self::Confirmed),
            "ACTIVE" => Some(Self::Active),
            "DELIVERED" => Some(Self::Delivered),
            "COMPLETED" => Some(Self::Completed),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One confirmed rental transaction.
///
/// `platform_fee_rate` is a snapshot taken at creation time; it is never
/// recomputed when the platform's global rate changes, so historical orders
/// stay auditable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: Uuid,
    pub vendor_id: Uuid,
    pub customer_id: Uuid,
    pub gross_amount: Money,
    pub deposit_amount: Money,
    pub platform_fee_rate: Decimal,
    pub status: OrderStatus,
    pub created_utc: DateTime<Utc>,
}
