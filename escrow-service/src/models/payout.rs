//! Vendor payout requests and their state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::money::Money;

/// How the vendor wants the funds delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutMethod {
    BankTransfer,
    Paypal,
}

impl PayoutMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BankTransfer => "BANK_TRANSFER",
            Self::Paypal => "PAYPAL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "BANK_TRANSFER" => Some(Self::BankTransfer),
            "PAYPAL" => Some(Self::Paypal),
            _ => None,
        }
    }
}

impl std::fmt::Display for PayoutMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payout request lifecycle.
///
/// `Pending` may go straight to a terminal state or pass through the
/// optional `Processing` stage. `Cancelled` is the vendor withdrawing a
/// still-pending request. Terminal states permit no further transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutStatus {
    Pending,
    Processing,
    Completed,
    Rejected,
    Cancelled,
}

impl PayoutStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Rejected | Self::Cancelled)
    }

    /// Whether the request still reserves funds against the vendor balance.
    pub fn reserves_funds(self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }

    pub fn can_transition_to(self, next: PayoutStatus) -> bool {
        use PayoutStatus::*;
        match (self, next) {
            (Pending, Processing | Completed | Rejected | Cancelled) => true,
            (Processing, Completed | Rejected) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Rejected => "REJECTED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "PROCESSING" => Some(Self::Processing),
            "COMPLETED" => Some(Self::Completed),
            "REJECTED" => Some(Self::Rejected),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Admin decision on a payout request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutDecision {
    Approve,
    Reject,
}

/// A vendor's withdrawal request against their available balance.
///
/// `requested_amount` is what leaves the vendor's balance when the request
/// completes; `commission` is the payout processing fee (zero unless the
/// platform configures one) and `net_amount` what the payment rail sends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutRequest {
    pub payout_id: Uuid,
    pub vendor_id: Uuid,
    pub requested_amount: Money,
    pub commission: Money,
    pub net_amount: Money,
    pub status: PayoutStatus,
    pub method: PayoutMethod,
    pub created_utc: DateTime<Utc>,
    pub resolved_utc: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_fans_out() {
        use PayoutStatus::*;
        for next in [Processing, Completed, Rejected, Cancelled] {
            assert!(Pending.can_transition_to(next));
        }
    }

    #[test]
    fn processing_resolves_only() {
        use PayoutStatus::*;
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Rejected));
        assert!(!Processing.can_transition_to(Cancelled));
        assert!(!Processing.can_transition_to(Pending));
    }

    #[test]
    fn terminal_states_are_final() {
        use PayoutStatus::*;
        for from in [Completed, Rejected, Cancelled] {
            assert!(from.is_terminal());
            for next in [Pending, Processing, Completed, Rejected, Cancelled] {
                assert!(!from.can_transition_to(next));
            }
        }
    }
}
