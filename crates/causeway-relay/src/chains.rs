use std::sync::Arc;

use alloy_primitives::Address;
use causeway_common::ChainId;
use dashmap::DashMap;

use crate::transport::MessageOrigin;

/// Destinations this deployment will bridge to, each with the sibling relay
/// address that inbound traffic from that chain must be signed by.
#[derive(Clone, Default)]
pub struct ChainRegistry {
    routes: Arc<DashMap<ChainId, Address>>
}

impl ChainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, chain: ChainId, remote: Address) {
        self.routes.insert(chain, remote);
    }

    /// Returns false when the chain was never registered.
    pub fn unregister(&self, chain: ChainId) -> bool {
        self.routes.remove(&chain).is_some()
    }

    pub fn is_supported(&self, chain: ChainId) -> bool {
        self.routes.contains_key(&chain)
    }

    pub fn remote(&self, chain: ChainId) -> Option<Address> {
        self.routes.get(&chain).map(|remote| *remote)
    }

    /// Inbound traffic must come from the registered sibling of its chain.
    pub fn verify_origin(&self, origin: &MessageOrigin) -> bool {
        self.remote(origin.chain) == Some(origin.sender)
    }
}
