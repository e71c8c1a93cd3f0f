//! Tick-walking swap over a [`LiquidityView`]. The walk is exact-input and
//! fee-free, protocol fees are skimmed off the input before the walk starts.
//! A swap either consumes its full input or fails, partial fills are never
//! returned.

use alloy::primitives::{I256, U256};
use thiserror::Error;
use uniswap_v3_math::{
    error::UniswapV3MathError,
    liquidity_math::add_delta,
    swap_math::compute_swap_step,
    tick_math::{
        MAX_SQRT_RATIO, MAX_TICK, MIN_SQRT_RATIO, MIN_TICK, get_sqrt_ratio_at_tick,
        get_tick_at_sqrt_ratio
    }
};

use crate::{
    ray::Ray,
    sqrt_pricex96::SqrtPriceX96,
    tick_info::Tick,
    tick_ledger::LiquidityView
};

const U256_1: U256 = U256::from_limbs([1, 0, 0, 0]);

#[derive(Debug, Error)]
pub enum SwapError {
    #[error("swap input amount is zero")]
    ZeroAmount,
    #[error("swap input amount exceeds the representable range")]
    AmountTooLarge,
    #[error("pool liquidity cannot absorb the requested input")]
    InsufficientLiquidity,
    #[error(transparent)]
    Math(#[from] UniswapV3MathError)
}

/// One full-input swap against a pinned liquidity view.
#[derive(Debug, Clone)]
pub struct PoolSwap<'a> {
    pub(crate) view:         LiquidityView<'a>,
    /// true when selling token0 for token1, driving the price down.
    pub(crate) zero_for_one: bool,
    pub(crate) amount_in:    U256
}

impl PoolSwap<'_> {
    pub fn swap(self) -> Result<PoolSwapResult, SwapError> {
        if self.amount_in.is_zero() {
            return Err(SwapError::ZeroAmount)
        }
        if self.amount_in > I256::MAX.into_raw() {
            return Err(SwapError::AmountTooLarge)
        }

        let start_price = self.view.sqrt_price;
        let start_tick = self.view.current_tick;

        let price_limit = if self.zero_for_one {
            MIN_SQRT_RATIO + U256_1
        } else {
            MAX_SQRT_RATIO - U256_1
        };

        let mut amount_remaining = I256::from_raw(self.amount_in);
        let mut sqrt_price: U256 = start_price.into();
        let mut tick = start_tick;
        let mut liquidity = self.view.liquidity;
        let mut amount_out = U256::ZERO;
        let mut steps = Vec::new();

        while amount_remaining != I256::ZERO && sqrt_price != price_limit {
            let step_start_price = sqrt_price;

            let (next_tick, initialized) = self.view.next_initialized_tick(tick, self.zero_for_one)?;
            let next_tick = next_tick.clamp(MIN_TICK, MAX_TICK);
            let sqrt_price_next = get_sqrt_ratio_at_tick(next_tick)?;

            let target_price = if (self.zero_for_one && sqrt_price_next < price_limit)
                || (!self.zero_for_one && sqrt_price_next > price_limit)
            {
                price_limit
            } else {
                sqrt_price_next
            };

            let (new_sqrt_price, step_in, step_out, _) =
                compute_swap_step(sqrt_price, target_price, liquidity, amount_remaining, 0)?;

            sqrt_price = new_sqrt_price;
            amount_remaining = amount_remaining.saturating_sub(I256::from_raw(step_in));
            amount_out += step_out;

            let reached_boundary = sqrt_price == sqrt_price_next;
            if reached_boundary {
                if initialized {
                    let net = self.view.net_at(next_tick);
                    let net = if self.zero_for_one { -net } else { net };
                    liquidity = add_delta(liquidity, net)?;
                }
                tick = if self.zero_for_one { next_tick - 1 } else { next_tick };
            } else if sqrt_price != step_start_price {
                tick = get_tick_at_sqrt_ratio(sqrt_price)?;
            }

            steps.push(PoolSwapStep {
                end_tick: next_tick,
                crossed: reached_boundary && initialized,
                liquidity,
                d_in: step_in,
                d_out: step_out
            });
        }

        if amount_remaining != I256::ZERO {
            return Err(SwapError::InsufficientLiquidity)
        }

        Ok(PoolSwapResult {
            zero_for_one: self.zero_for_one,
            start_price,
            start_tick,
            end_price: sqrt_price.into(),
            end_tick: tick,
            end_liquidity: liquidity,
            amount_in: self.amount_in,
            amount_out,
            steps
        })
    }
}

/// Fully-resolved swap ready to be committed back to the ledger.
#[derive(Debug, Clone)]
pub struct PoolSwapResult {
    pub zero_for_one:  bool,
    pub start_price:   SqrtPriceX96,
    pub start_tick:    Tick,
    pub end_price:     SqrtPriceX96,
    pub end_tick:      Tick,
    pub end_liquidity: u128,
    pub amount_in:     U256,
    pub amount_out:    U256,
    pub steps:         Vec<PoolSwapStep>
}

impl PoolSwapResult {
    /// Average execution price of token0 in token1, across the whole walk.
    pub fn avg_price(&self) -> Option<Ray> {
        if self.amount_in.is_zero() || self.amount_out.is_zero() {
            return None
        }

        let (t0, t1) = if self.zero_for_one {
            (self.amount_in, self.amount_out)
        } else {
            (self.amount_out, self.amount_in)
        };

        Some(Ray::calc_price(t0, t1))
    }

    pub fn crossed_ticks(&self) -> usize {
        self.steps.iter().filter(|step| step.crossed).count()
    }
}

/// One stride of the walk, ending at `end_tick`.
#[derive(Clone, Debug)]
pub struct PoolSwapStep {
    pub end_tick:  Tick,
    /// true when the stride folded an initialized boundary's net liquidity in.
    pub crossed:   bool,
    pub liquidity: u128,
    pub d_in:      U256,
    pub d_out:     U256
}
