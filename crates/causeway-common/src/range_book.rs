use std::sync::Arc;

use alloy_primitives::Address;
use causeway_amm::{
    AmmError, PoolId,
    range::{RangeStake, UserRanges},
    tick_info::Tick
};
use dashmap::DashMap;

/// Every user's staked ranges, keyed by pool and owner. Entries are kept
/// alive after a user fully exits so slot ids stay monotone for the whole
/// life of the book, a stale slot id can never address a later stake.
#[derive(Clone, Default)]
pub struct RangeBook {
    positions: Arc<DashMap<(PoolId, Address), UserRanges>>
}

impl RangeBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grow(
        &self,
        pool: PoolId,
        user: Address,
        lower_tick: Tick,
        upper_tick: Tick,
        liquidity: u128
    ) -> u64 {
        self.positions
            .entry((pool, user))
            .or_default()
            .grow(lower_tick, upper_tick, liquidity)
    }

    pub fn shrink(
        &self,
        pool: PoolId,
        user: Address,
        slot: u64,
        liquidity: u128
    ) -> Result<RangeStake, AmmError> {
        self.positions
            .get_mut(&(pool, user))
            .ok_or(AmmError::RangeSlotMissing(slot))?
            .shrink(slot, liquidity)
    }

    pub fn has_ranges(&self, pool: PoolId, user: Address) -> bool {
        self.positions
            .get(&(pool, user))
            .map(|ranges| !ranges.is_empty())
            .unwrap_or(false)
    }

    pub fn get(&self, pool: PoolId, user: Address, slot: u64) -> Option<RangeStake> {
        self.positions
            .get(&(pool, user))
            .and_then(|ranges| ranges.get(slot).copied())
    }

    pub fn ranges(&self, pool: PoolId, user: Address) -> Vec<(u64, RangeStake)> {
        self.positions
            .get(&(pool, user))
            .map(|ranges| ranges.iter().map(|(slot, stake)| (slot, *stake)).collect())
            .unwrap_or_default()
    }
}
