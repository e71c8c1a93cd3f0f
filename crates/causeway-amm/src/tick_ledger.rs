//! Owned tick book for a single pool. Tracks every initialized tick, the
//! packed bitmap used for tick traversal, and the liquidity active at the
//! current price. All mutation is validated before any state is touched so a
//! failed call leaves the ledger exactly as it was.

use std::collections::HashMap;

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use uniswap_v3_math::{
    error::UniswapV3MathError,
    tick_bitmap::{flip_tick, next_initialized_tick_within_one_word},
    tick_math::{MAX_TICK, MIN_TICK}
};

use crate::{
    AmmError,
    sqrt_pricex96::SqrtPriceX96,
    tick_info::{Tick, TickInfo}
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickLedger {
    pub(crate) tick_spacing:     i32,
    pub(crate) current_tick:     Tick,
    pub(crate) sqrt_price:       SqrtPriceX96,
    pub(crate) active_liquidity: u128,
    /// only holds ticks with nonzero gross liquidity.
    initialized_ticks:           HashMap<Tick, TickInfo>,
    /// word map mirroring `initialized_ticks`.
    tick_bitmap:                 HashMap<i16, U256>
}

impl TickLedger {
    /// Opens an empty book priced at tick zero.
    pub fn new(tick_spacing: i32) -> Self {
        Self {
            tick_spacing,
            current_tick: 0,
            sqrt_price: SqrtPriceX96::from(U256::from(1u8) << 96),
            active_liquidity: 0,
            initialized_ticks: HashMap::default(),
            tick_bitmap: HashMap::default()
        }
    }

    pub fn tick_spacing(&self) -> i32 {
        self.tick_spacing
    }

    pub fn current_tick(&self) -> Tick {
        self.current_tick
    }

    pub fn sqrt_price(&self) -> SqrtPriceX96 {
        self.sqrt_price
    }

    pub fn active_liquidity(&self) -> u128 {
        self.active_liquidity
    }

    pub fn has_ranges(&self) -> bool {
        !self.initialized_ticks.is_empty()
    }

    /// Bounds, ordering and spacing-alignment checks shared by every
    /// range-shaped entrypoint.
    pub fn check_range(&self, lower: Tick, upper: Tick) -> Result<(), AmmError> {
        if lower >= upper || lower < MIN_TICK || upper > MAX_TICK {
            return Err(AmmError::InvalidTickRange { lower, upper })
        }
        if lower % self.tick_spacing != 0 {
            return Err(AmmError::UnalignedTick { tick: lower, spacing: self.tick_spacing })
        }
        if upper % self.tick_spacing != 0 {
            return Err(AmmError::UnalignedTick { tick: upper, spacing: self.tick_spacing })
        }

        Ok(())
    }

    /// Applies a signed liquidity delta across `[lower, upper)`. Both
    /// boundary ticks and the active-liquidity adjustment are validated
    /// up front, then committed together.
    pub fn apply_range_delta(
        &mut self,
        lower: Tick,
        upper: Tick,
        delta: i128
    ) -> Result<(), AmmError> {
        self.check_range(lower, upper)?;
        self.check_tick_delta(lower, delta, false)?;
        self.check_tick_delta(upper, delta, true)?;

        let in_range = lower <= self.current_tick && self.current_tick < upper;
        let next_active = if in_range {
            Some(if delta < 0 {
                self.active_liquidity
                    .checked_sub(delta.unsigned_abs())
                    .ok_or(AmmError::LiquidityUnderflow)?
            } else {
                self.active_liquidity
                    .checked_add(delta as u128)
                    .ok_or(AmmError::LiquidityOverflow)?
            })
        } else {
            None
        };

        self.update_tick(lower, delta, false)?;
        self.update_tick(upper, delta, true)?;

        if let Some(active) = next_active {
            self.active_liquidity = active;
        }

        Ok(())
    }

    fn check_tick_delta(&self, tick: Tick, delta: i128, upper: bool) -> Result<(), AmmError> {
        let info = self.initialized_ticks.get(&tick).cloned().unwrap_or_default();

        if delta < 0 {
            info.liquidity_gross
                .checked_sub(delta.unsigned_abs())
                .ok_or(AmmError::LiquidityUnderflow)?;
        } else {
            info.liquidity_gross
                .checked_add(delta as u128)
                .ok_or(AmmError::LiquidityOverflow)?;
        }

        let net_delta =
            if upper { delta.checked_neg().ok_or(AmmError::LiquidityOverflow)? } else { delta };
        info.liquidity_net
            .checked_add(net_delta)
            .ok_or(AmmError::LiquidityOverflow)?;

        Ok(())
    }

    fn update_tick(&mut self, tick: Tick, delta: i128, upper: bool) -> Result<(), AmmError> {
        let (was_initialized, now_initialized) = {
            let info = self.initialized_ticks.entry(tick).or_default();
            let was = info.liquidity_gross != 0;

            if delta < 0 {
                info.liquidity_gross -= delta.unsigned_abs();
            } else {
                info.liquidity_gross += delta as u128;
            }
            if upper {
                info.liquidity_net -= delta;
            } else {
                info.liquidity_net += delta;
            }

            (was, info.liquidity_gross != 0)
        };

        if !now_initialized {
            self.initialized_ticks.remove(&tick);
        }
        if was_initialized != now_initialized {
            flip_tick(&mut self.tick_bitmap, tick, self.tick_spacing)?;
        }

        Ok(())
    }

    /// Read-only view pinned at the current price, the shape swaps walk over.
    pub fn at_current(&self) -> LiquidityView<'_> {
        LiquidityView {
            tick_spacing:      self.tick_spacing,
            current_tick:      self.current_tick,
            sqrt_price:        self.sqrt_price,
            liquidity:         self.active_liquidity,
            initialized_ticks: &self.initialized_ticks,
            tick_bitmap:       &self.tick_bitmap
        }
    }

    /// Adopts the post-swap cursor produced from a [`LiquidityView`] walk.
    pub fn commit_swap(&mut self, tick: Tick, sqrt_price: SqrtPriceX96, liquidity: u128) {
        self.current_tick = tick;
        self.sqrt_price = sqrt_price;
        self.active_liquidity = liquidity;
    }
}

/// Borrowed snapshot of the book at one price point.
#[derive(Clone, Debug)]
pub struct LiquidityView<'a> {
    pub(crate) tick_spacing: i32,
    pub(crate) current_tick: Tick,
    pub(crate) sqrt_price:   SqrtPriceX96,
    pub(crate) liquidity:    u128,
    initialized_ticks:       &'a HashMap<Tick, TickInfo>,
    tick_bitmap:             &'a HashMap<i16, U256>
}

impl LiquidityView<'_> {
    /// Next initialized tick at or beyond `from` in the swap direction,
    /// scanning one bitmap word at a time.
    pub fn next_initialized_tick(
        &self,
        from: Tick,
        zero_for_one: bool
    ) -> Result<(Tick, bool), UniswapV3MathError> {
        next_initialized_tick_within_one_word(
            self.tick_bitmap,
            from,
            self.tick_spacing,
            zero_for_one
        )
    }

    pub fn net_at(&self, tick: Tick) -> i128 {
        self.initialized_ticks
            .get(&tick)
            .map(|info| info.liquidity_net)
            .unwrap_or_default()
    }
}
