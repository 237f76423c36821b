//! Per-vendor serialization of balance-affecting mutations.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Registry of per-vendor mutexes.
///
/// Escrow release, payout creation, and payout resolution for one vendor
/// all serialize on that vendor's lock, so no two writers can validate
/// against the same stale balance. Unrelated vendors proceed in parallel.
#[derive(Clone, Default)]
pub struct VendorLocks {
    locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl VendorLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, vendor_id: Uuid) -> OwnedMutexGuard<()> {
        let mutex = self
            .locks
            .entry(vendor_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }
}
