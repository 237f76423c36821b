//! Domain models for the escrow ledger and payout engine.

pub mod actor;
pub mod balance;
pub mod entry;
pub mod money;
pub mod order;
pub mod payout;
pub mod vendor;

pub use actor::{ActorContext, ActorRole};
pub use balance::VendorBalance;
pub use entry::{EntryType, LedgerEntry};
pub use money::{Money, MoneyError};
pub use order::{Order, OrderStatus};
pub use payout::{PayoutDecision, PayoutMethod, PayoutRequest, PayoutStatus};
pub use vendor::{PayoutMethodDetails, Vendor};
