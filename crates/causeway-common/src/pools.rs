use std::{
    collections::HashMap,
    ops::Deref,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering}
    }
};

use causeway_amm::{PoolId, PoolState};
use dashmap::{DashMap, mapref::one::Ref};
use serde::{Deserialize, Serialize};
use tokio::sync::{Notify, futures::Notified};

/// Shared map of every pool's AMM state. Writers commit through
/// [`Pools::update_pool`] and call [`Pools::publish`] once the mutation is
/// final so observers can chase a monotone version counter.
#[derive(Clone)]
pub struct Pools {
    pools:    Arc<DashMap<PoolId, PoolState>>,
    // bumped once per committed mutation.
    version:  Arc<AtomicU64>,
    notifier: Arc<Notify>
}

impl Deref for Pools {
    type Target = Arc<DashMap<PoolId, PoolState>>;

    fn deref(&self) -> &Self::Target {
        &self.pools
    }
}

impl Default for Pools {
    fn default() -> Self {
        Self::new()
    }
}

impl Pools {
    pub fn new() -> Self {
        Self {
            pools:    Arc::new(DashMap::default()),
            version:  Arc::new(AtomicU64::new(0)),
            notifier: Arc::new(Notify::new())
        }
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Marks the current state as a new published version and wakes every
    /// waiter.
    pub fn publish(&self) {
        self.version.fetch_add(1, Ordering::SeqCst);
        self.notifier.notify_waiters();
    }

    pub async fn wait_for_change(&self) {
        self.notifier.notified().await;
    }

    pub fn change_future(&self) -> Notified<'_> {
        self.notifier.notified()
    }

    pub fn get_pool(&self, pool_id: &PoolId) -> Option<Ref<'_, PoolId, PoolState>> {
        self.pools.get(pool_id)
    }

    /// Runs `f` with exclusive access to one pool's state. Returns `None`
    /// when the pool does not exist.
    pub fn update_pool<R>(
        &self,
        pool_id: &PoolId,
        f: impl FnOnce(&mut PoolState) -> R
    ) -> Option<R> {
        let mut entry = self.pools.get_mut(pool_id)?;
        Some(f(entry.value_mut()))
    }

    pub fn snapshot(&self) -> PoolsSnapshot {
        PoolsSnapshot {
            version: self.version(),
            pools:   self
                .pools
                .iter()
                .map(|entry| (*entry.key(), entry.value().clone()))
                .collect()
        }
    }

    pub fn restore(snapshot: PoolsSnapshot) -> Self {
        Self {
            pools:    Arc::new(snapshot.pools.into_iter().collect()),
            version:  Arc::new(AtomicU64::new(snapshot.version)),
            notifier: Arc::new(Notify::new())
        }
    }
}

/// Point-in-time copy of the whole pool map, serializable for persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolsSnapshot {
    pub version: u64,
    pub pools:   HashMap<PoolId, PoolState>
}
