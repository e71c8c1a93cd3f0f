//! Per-pool entry claims. One state-mutating entry point holds a pool's
//! claim for its whole body; a nested attempt on the same pool (a reentrant
//! callback, in the model this engine mirrors) fails instead of deadlocking
//! or interleaving.

use std::sync::Arc;

use causeway_common::PoolId;
use dashmap::{DashMap, mapref::entry::Entry};

#[derive(Clone, Default)]
pub struct EntryGuard {
    live: Arc<DashMap<PoolId, ()>>
}

impl EntryGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the pool, or returns `None` when a call already holds it.
    pub fn claim(&self, pool: PoolId) -> Option<PoolClaim> {
        match self.live.entry(pool) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(());
                Some(PoolClaim { live: Arc::clone(&self.live), pool })
            }
        }
    }
}

/// RAII claim, released on drop no matter how the entry point exits.
pub struct PoolClaim {
    live: Arc<DashMap<PoolId, ()>>,
    pool: PoolId
}

impl Drop for PoolClaim {
    fn drop(&mut self) {
        self.live.remove(&self.pool);
    }
}
