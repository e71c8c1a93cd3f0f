//! Per-user bookkeeping of staked tick ranges. Slots are arena style, a
//! slot id is handed out once and stays valid for the life of the stake,
//! ids are never recycled after a slot drains.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{AmmError, tick_info::Tick};

/// One staked range, keyed by the slot id that addressed it at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeStake {
    pub lower_tick: Tick,
    pub upper_tick: Tick,
    pub liquidity:  u128
}

/// All ranges one user holds in a single pool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserRanges {
    slots:     BTreeMap<u64, RangeStake>,
    next_slot: u64
}

impl UserRanges {
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, slot: u64) -> Option<&RangeStake> {
        self.slots.get(&slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &RangeStake)> {
        self.slots.iter().map(|(slot, stake)| (*slot, stake))
    }

    pub fn total_liquidity(&self) -> u128 {
        self.slots
            .values()
            .fold(0u128, |acc, stake| acc.saturating_add(stake.liquidity))
    }

    /// Appends a stake for `[lower_tick, upper_tick)` under a fresh slot.
    /// Every add gets its own slot, even a repeat of an already-staked
    /// range, so slots stay independently removable.
    pub fn grow(&mut self, lower_tick: Tick, upper_tick: Tick, liquidity: u128) -> u64 {
        let slot = self.next_slot;
        self.next_slot += 1;
        self.slots
            .insert(slot, RangeStake { lower_tick, upper_tick, liquidity });

        slot
    }

    /// Burns `liquidity` out of `slot`, dropping the slot once drained.
    /// Returns a stake describing exactly what was removed.
    pub fn shrink(&mut self, slot: u64, liquidity: u128) -> Result<RangeStake, AmmError> {
        let stake = self
            .slots
            .get_mut(&slot)
            .ok_or(AmmError::RangeSlotMissing(slot))?;

        if liquidity > stake.liquidity {
            return Err(AmmError::RangeLiquidityExceeded {
                slot,
                have: stake.liquidity,
                want: liquidity
            })
        }

        stake.liquidity -= liquidity;
        let removed =
            RangeStake { lower_tick: stake.lower_tick, upper_tick: stake.upper_tick, liquidity };

        if stake.liquidity == 0 {
            self.slots.remove(&slot);
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_stakes_of_one_range_each_get_a_fresh_slot() {
        let mut ranges = UserRanges::default();

        let first = ranges.grow(-100, 100, 500);
        let second = ranges.grow(-100, 100, 700);
        assert_ne!(first, second);
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges.get(first).unwrap().liquidity, 500);
        assert_eq!(ranges.get(second).unwrap().liquidity, 700);

        // draining one leaves the other untouched.
        ranges.shrink(first, 500).unwrap();
        assert_eq!(ranges.get(second).unwrap().liquidity, 700);
    }

    #[test]
    fn distinct_ranges_get_distinct_slots() {
        let mut ranges = UserRanges::default();

        let a = ranges.grow(-100, 100, 500);
        let b = ranges.grow(-50, 50, 500);
        assert_ne!(a, b);
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges.total_liquidity(), 1000);
    }

    #[test]
    fn partial_shrink_leaves_the_remainder_staked() {
        let mut ranges = UserRanges::default();
        let slot = ranges.grow(-100, 100, 1000);

        let removed = ranges.shrink(slot, 400).unwrap();
        assert_eq!(removed.liquidity, 400);
        assert_eq!(removed.lower_tick, -100);
        assert_eq!(removed.upper_tick, 100);
        assert_eq!(ranges.get(slot).unwrap().liquidity, 600);
    }

    #[test]
    fn draining_a_slot_retires_its_id() {
        let mut ranges = UserRanges::default();
        let slot = ranges.grow(-100, 100, 1000);

        ranges.shrink(slot, 1000).unwrap();
        assert!(ranges.is_empty());
        assert!(matches!(ranges.shrink(slot, 1), Err(AmmError::RangeSlotMissing(s)) if s == slot));

        // a fresh stake of the same range must not resurrect the old id.
        let reborn = ranges.grow(-100, 100, 10);
        assert_ne!(reborn, slot);
    }

    #[test]
    fn over_shrink_reports_the_shortfall() {
        let mut ranges = UserRanges::default();
        let slot = ranges.grow(-100, 100, 1000);

        let err = ranges.shrink(slot, 1500).unwrap_err();
        assert!(matches!(
            err,
            AmmError::RangeLiquidityExceeded { have: 1000, want: 1500, .. }
        ));
        assert_eq!(ranges.get(slot).unwrap().liquidity, 1000);
    }
}
