use std::sync::Arc;

use alloy::sol_types::SolValue;
use alloy_primitives::{B256, keccak256};
use dashmap::DashSet;

use crate::transport::MessageOrigin;

/// At-most-once inbound delivery. Keys bind the verified origin to the
/// transport's message id, so a forged sender can never occupy the slot of
/// a legitimate message.
#[derive(Clone, Default)]
pub struct ReplayGuard {
    seen: Arc<DashSet<B256>>
}

impl ReplayGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(origin: &MessageOrigin, guid: B256) -> B256 {
        keccak256((origin.chain, origin.sender, guid).abi_encode())
    }

    /// Records the key, returning false when it was already present.
    pub fn mark_handled(&self, key: B256) -> bool {
        self.seen.insert(key)
    }

    pub fn already_handled(&self, key: B256) -> bool {
        self.seen.contains(&key)
    }

    pub fn handled_count(&self) -> usize {
        self.seen.len()
    }
}
