use alloy::primitives::{FixedBytes, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uniswap_v3_math::error::UniswapV3MathError;

use crate::{
    pool_swap::{PoolSwap, PoolSwapResult, SwapError},
    ray::Ray,
    sqrt_pricex96::SqrtPriceX96,
    tick_info::Tick,
    tick_ledger::TickLedger
};

pub mod liquidity_math;
pub mod pool_swap;
pub mod range;
pub mod ray;
pub mod sqrt_pricex96;
pub mod tick_info;
pub mod tick_ledger;

/// Content hash of a pool's ordered token pair.
pub type PoolId = FixedBytes<32>;

pub const STABLE_TICK_SPACING: i32 = 1;
pub const STANDARD_TICK_SPACING: i32 = 10;

pub fn tick_spacing_for(stable_pair: bool) -> i32 {
    if stable_pair { STABLE_TICK_SPACING } else { STANDARD_TICK_SPACING }
}

#[derive(Debug, Error)]
pub enum AmmError {
    #[error("tick range [{lower}, {upper}) is inverted or out of bounds")]
    InvalidTickRange { lower: Tick, upper: Tick },
    #[error("tick {tick} is not aligned to spacing {spacing}")]
    UnalignedTick { tick: Tick, spacing: i32 },
    #[error("deposit is too small to buy any liquidity")]
    ZeroLiquidity,
    #[error("liquidity overflow")]
    LiquidityOverflow,
    #[error("liquidity underflow")]
    LiquidityUnderflow,
    #[error("range slot {0} does not exist")]
    RangeSlotMissing(u64),
    #[error("range slot {slot} holds {have} liquidity, cannot remove {want}")]
    RangeLiquidityExceeded { slot: u64, have: u128, want: u128 },
    #[error(transparent)]
    Math(#[from] UniswapV3MathError)
}

/// Outcome of pricing a range mutation, the amounts are exactly what the
/// caller settles when the quote is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeQuote {
    pub lower_tick: Tick,
    pub upper_tick: Tick,
    pub liquidity:  u128,
    pub amount0:    U256,
    pub amount1:    U256
}

/// Pure concentrated-liquidity state of one pool. All entrypoints are split
/// into a read-only quote and an infallible-by-construction commit so callers
/// can settle funds between the two without partial pool writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolState {
    ledger:          TickLedger,
    total_liquidity: u128
}

impl PoolState {
    pub fn new(tick_spacing: i32) -> Self {
        Self { ledger: TickLedger::new(tick_spacing), total_liquidity: 0 }
    }

    pub fn tick_spacing(&self) -> i32 {
        self.ledger.tick_spacing()
    }

    pub fn current_tick(&self) -> Tick {
        self.ledger.current_tick()
    }

    pub fn sqrt_price(&self) -> SqrtPriceX96 {
        self.ledger.sqrt_price()
    }

    pub fn active_liquidity(&self) -> u128 {
        self.ledger.active_liquidity()
    }

    /// Gross liquidity staked across every range of the pool.
    pub fn total_liquidity(&self) -> u128 {
        self.total_liquidity
    }

    pub fn ray_price(&self) -> Ray {
        self.ledger.sqrt_price().into()
    }

    /// Prices a deposit into `[lower, upper)`. Liquidity rounds down against
    /// the deposit, the amounts actually owed round up against the caller.
    pub fn quote_add(
        &self,
        amount0: U256,
        amount1: U256,
        lower: Tick,
        upper: Tick
    ) -> Result<RangeQuote, AmmError> {
        self.ledger.check_range(lower, upper)?;

        let sqrt_lower = SqrtPriceX96::at_tick(lower)?;
        let sqrt_upper = SqrtPriceX96::at_tick(upper)?;
        let sqrt_price = self.ledger.sqrt_price().as_u256();

        let liquidity = liquidity_math::liquidity_for_amounts(
            sqrt_price,
            sqrt_lower.as_u256(),
            sqrt_upper.as_u256(),
            amount0,
            amount1
        )?;
        if liquidity.is_zero() {
            return Err(AmmError::ZeroLiquidity)
        }

        let liquidity: u128 = liquidity
            .try_into()
            .map_err(|_| AmmError::LiquidityOverflow)?;
        if liquidity > i128::MAX as u128 {
            return Err(AmmError::LiquidityOverflow)
        }

        let (amount0, amount1) = liquidity_math::amounts_for_liquidity(
            sqrt_price,
            sqrt_lower.as_u256(),
            sqrt_upper.as_u256(),
            liquidity,
            true
        )?;

        Ok(RangeQuote { lower_tick: lower, upper_tick: upper, liquidity, amount0, amount1 })
    }

    pub fn commit_add(&mut self, quote: &RangeQuote) -> Result<(), AmmError> {
        let delta = i128::try_from(quote.liquidity).map_err(|_| AmmError::LiquidityOverflow)?;

        self.ledger
            .apply_range_delta(quote.lower_tick, quote.upper_tick, delta)?;
        self.total_liquidity = self
            .total_liquidity
            .checked_add(quote.liquidity)
            .ok_or(AmmError::LiquidityOverflow)?;

        Ok(())
    }

    /// Prices a withdrawal of `liquidity` from `[lower, upper)`. Amounts
    /// round down against the caller.
    pub fn quote_remove(
        &self,
        lower: Tick,
        upper: Tick,
        liquidity: u128
    ) -> Result<RangeQuote, AmmError> {
        self.ledger.check_range(lower, upper)?;

        let sqrt_lower = SqrtPriceX96::at_tick(lower)?;
        let sqrt_upper = SqrtPriceX96::at_tick(upper)?;

        let (amount0, amount1) = liquidity_math::amounts_for_liquidity(
            self.ledger.sqrt_price().as_u256(),
            sqrt_lower.as_u256(),
            sqrt_upper.as_u256(),
            liquidity,
            false
        )?;

        Ok(RangeQuote { lower_tick: lower, upper_tick: upper, liquidity, amount0, amount1 })
    }

    pub fn commit_remove(&mut self, quote: &RangeQuote) -> Result<(), AmmError> {
        let delta = i128::try_from(quote.liquidity).map_err(|_| AmmError::LiquidityOverflow)?;

        self.ledger
            .apply_range_delta(quote.lower_tick, quote.upper_tick, -delta)?;
        self.total_liquidity = self
            .total_liquidity
            .checked_sub(quote.liquidity)
            .ok_or(AmmError::LiquidityUnderflow)?;

        Ok(())
    }

    /// Walks the book for an exact-input swap without touching state.
    pub fn quote_swap(&self, zero_for_one: bool, amount_in: U256) -> Result<PoolSwapResult, SwapError> {
        if self.total_liquidity == 0 {
            return Err(SwapError::InsufficientLiquidity)
        }

        PoolSwap { view: self.ledger.at_current(), zero_for_one, amount_in }.swap()
    }

    pub fn commit_swap(&mut self, result: &PoolSwapResult) {
        self.ledger
            .commit_swap(result.end_tick, result.end_price, result.end_liquidity);
    }
}
