//! Pool registry: the authoritative map from pair identity to pool
//! metadata. Pools are soft-deactivated, never removed, so the pair history
//! stays enumerable forever. Pair identity is order-sensitive by design,
//! (A,B) and (B,A) are two independent pools.

use alloy_primitives::Address;
use causeway_common::{PairKey, PoolId, lp_token_address};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bank::NATIVE;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("pair tokens are zero, equal, or the native asset")]
    InvalidTokens,
    #[error("fee recipient cannot be the zero address")]
    InvalidFeeRecipient,
    #[error("an active pool already exists for this pair")]
    PairAlreadyExists,
    #[error("no active pool for this pair")]
    PoolNotFound
}

/// Everything about a pool that is not AMM state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolMeta {
    pub pair:          PairKey,
    pub name:          String,
    pub symbol:        String,
    pub lp_token:      Address,
    pub fee_bps:       u16,
    pub fee_recipient: Address,
    pub stable_pair:   bool,
    pub active:        bool
}

#[derive(Default)]
pub struct PoolRegistry {
    pools: DashMap<PoolId, PoolMeta>
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new active pool for the ordered pair. A pair whose pool
    /// was deactivated may be created anew; a live pool blocks creation.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &self,
        base: Address,
        quote: Address,
        name: String,
        symbol: String,
        fee_bps: u16,
        fee_recipient: Address,
        stable_pair: bool
    ) -> Result<(PoolId, PoolMeta), RegistryError> {
        if base == NATIVE || quote == NATIVE || base == quote {
            return Err(RegistryError::InvalidTokens);
        }
        if fee_recipient == Address::ZERO {
            return Err(RegistryError::InvalidFeeRecipient);
        }

        let pair = PairKey { base, quote };
        let pool_id: PoolId = pair.into();

        if self.pools.get(&pool_id).is_some_and(|meta| meta.active) {
            return Err(RegistryError::PairAlreadyExists);
        }

        let meta = PoolMeta {
            pair,
            name,
            symbol,
            lp_token: lp_token_address(pool_id),
            fee_bps,
            fee_recipient,
            stable_pair,
            active: true
        };
        self.pools.insert(pool_id, meta.clone());

        Ok((pool_id, meta))
    }

    /// Irreversibly marks the pair's pool inactive.
    pub fn deactivate(&self, base: Address, quote: Address) -> Result<PoolMeta, RegistryError> {
        let pool_id: PoolId = PairKey { base, quote }.into();
        let mut entry = self
            .pools
            .get_mut(&pool_id)
            .ok_or(RegistryError::PoolNotFound)?;
        if !entry.active {
            return Err(RegistryError::PoolNotFound);
        }

        entry.active = false;
        Ok(entry.clone())
    }

    pub fn get(&self, pool_id: &PoolId) -> Option<PoolMeta> {
        self.pools.get(pool_id).map(|meta| meta.clone())
    }

    pub fn by_pair(&self, base: Address, quote: Address) -> Option<(PoolId, PoolMeta)> {
        let pool_id: PoolId = PairKey { base, quote }.into();
        self.get(&pool_id).map(|meta| (pool_id, meta))
    }

    /// Metadata for the pair, but only while the pool is live.
    pub fn active(&self, base: Address, quote: Address) -> Result<(PoolId, PoolMeta), RegistryError> {
        self.by_pair(base, quote)
            .filter(|(_, meta)| meta.active)
            .ok_or(RegistryError::PoolNotFound)
    }

    pub fn contains(&self, base: Address, quote: Address) -> bool {
        let pool_id: PoolId = PairKey { base, quote }.into();
        self.pools.contains_key(&pool_id)
    }

    /// Every pool ever created, active or not.
    pub fn iter(&self) -> Vec<(PoolId, PoolMeta)> {
        self.pools
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}
