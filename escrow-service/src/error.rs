//! Typed, caller-visible errors for the ledger and payout engine.
//!
//! Everything here is recoverable and returned as a value; only storage
//! failures are unexpected, and those surface as `Store` with the cause
//! logged for operator attention.

use thiserror::Error;
use uuid::Uuid;

use crate::models::{Money, MoneyError, OrderStatus};
use service_core::error::AppError;

/// Storage backend failure, independent of which backend is in use.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint fired. The service layer turns this into the
    /// appropriate domain error (e.g. a duplicate hold that lost a race).
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage failure: {0}")]
    Backend(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("a hold already exists for order {0}")]
    DuplicateHold(Uuid),

    #[error("no active hold for order {0}")]
    NoActiveHold(Uuid),

    #[error("the hold for order {0} is already closed")]
    AlreadyClosed(Uuid),

    #[error("order {order_id} is {status}; escrow release requires a completed order")]
    OrderNotCompleted {
        order_id: Uuid,
        status: OrderStatus,
    },

    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance {
        requested: Money,
        available: Money,
    },

    #[error("payout amount {requested} is below the minimum of {minimum}")]
    BelowMinimum { requested: Money, minimum: Money },

    #[error("vendor {0} has no matching payout method on file")]
    MissingPayoutMethod(Uuid),

    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("actor {0} is not authorized for this operation")]
    Unauthorized(Uuid),

    #[error("order {0} not found")]
    OrderNotFound(Uuid),

    #[error("payout {0} not found")]
    PayoutNotFound(Uuid),

    #[error("vendor {0} not found")]
    VendorNotFound(Uuid),

    #[error("vendor {0} is already registered")]
    VendorExists(Uuid),

    #[error("order {order_id} belongs to vendor {expected}, not {got}")]
    VendorMismatch {
        order_id: Uuid,
        expected: Uuid,
        got: Uuid,
    },

    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(Money),

    #[error(transparent)]
    Money(#[from] MoneyError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LedgerError {
    /// Label for the error counter, low cardinality by construction.
    pub fn metric_label(&self) -> &'static str {
        match self {
            Self::DuplicateHold(_) => "duplicate_hold",
            Self::NoActiveHold(_) => "no_active_hold",
            Self::AlreadyClosed(_) => "already_closed",
            Self::OrderNotCompleted { .. } => "order_not_completed",
            Self::InsufficientBalance { .. } => "insufficient_balance",
            Self::BelowMinimum { .. } => "below_minimum",
            Self::MissingPayoutMethod(_) => "missing_payout_method",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::Unauthorized(_) => "unauthorized",
            Self::OrderNotFound(_)
            | Self::PayoutNotFound(_)
            | Self::VendorNotFound(_) => "not_found",
            Self::VendorExists(_) => "vendor_exists",
            Self::VendorMismatch { .. } => "vendor_mismatch",
            Self::NonPositiveAmount(_) => "non_positive_amount",
            Self::Money(_) => "money",
            Self::Store(_) => "store",
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        crate::services::metrics::ERRORS_TOTAL
            .with_label_values(&[err.metric_label()])
            .inc();

        match err {
            // Expected, everyday conditions the caller can act on.
            LedgerError::InsufficientBalance { .. }
            | LedgerError::BelowMinimum { .. }
            | LedgerError::MissingPayoutMethod(_)
            | LedgerError::NonPositiveAmount(_)
            | LedgerError::Money(_) => AppError::Unprocessable(anyhow::anyhow!("{}", err)),

            // Bug-or-race conditions, surfaced distinctly as conflicts.
            LedgerError::DuplicateHold(_)
            | LedgerError::AlreadyClosed(_)
            | LedgerError::OrderNotCompleted { .. }
            | LedgerError::InvalidTransition { .. }
            | LedgerError::VendorExists(_) => AppError::Conflict(anyhow::anyhow!("{}", err)),

            LedgerError::VendorMismatch { .. } => AppError::BadRequest(anyhow::anyhow!("{}", err)),

            LedgerError::Unauthorized(_) => AppError::Forbidden(anyhow::anyhow!("{}", err)),

            LedgerError::NoActiveHold(_)
            | LedgerError::OrderNotFound(_)
            | LedgerError::PayoutNotFound(_)
            | LedgerError::VendorNotFound(_) => AppError::NotFound(anyhow::anyhow!("{}", err)),

            LedgerError::Store(e) => AppError::DatabaseError(anyhow::anyhow!("{}", e)),
        }
    }
}
