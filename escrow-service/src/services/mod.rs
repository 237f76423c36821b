//! Service layer: domain operations over injected storage.

pub mod balance;
pub mod commission;
pub mod database;
pub mod escrow;
pub mod locks;
pub mod memory;
pub mod metrics;
pub mod orders;
pub mod payout;
pub mod store;

pub use balance::{BalanceService, compute_balance};
pub use commission::{Split, compute_split};
pub use database::PgStore;
pub use escrow::EscrowService;
pub use locks::VendorLocks;
pub use memory::MemoryStore;
pub use metrics::{get_metrics, init_metrics};
pub use orders::OrderService;
pub use payout::{PayoutRules, PayoutService};
pub use store::{LedgerStore, VendorRepository};
