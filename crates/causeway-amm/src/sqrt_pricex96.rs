use std::ops::Deref;

use alloy::primitives::{U160, U256};
use serde::{Deserialize, Serialize};
use uniswap_v3_math::{
    error::UniswapV3MathError,
    tick_math::{get_sqrt_ratio_at_tick, get_tick_at_sqrt_ratio}
};

/// A Q64.96 square-root price.
#[derive(
    Copy, Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SqrtPriceX96(U160);

impl SqrtPriceX96 {
    pub fn at_tick(tick: i32) -> Result<Self, UniswapV3MathError> {
        Ok(Self(get_sqrt_ratio_at_tick(tick)?.saturating_to::<U160>()))
    }

    pub fn to_tick(&self) -> Result<i32, UniswapV3MathError> {
        get_tick_at_sqrt_ratio(U256::from(self.0))
    }

    pub fn as_u256(&self) -> U256 {
        U256::from(self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Deref for SqrtPriceX96 {
    type Target = U160;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<U160> for SqrtPriceX96 {
    fn from(value: U160) -> Self {
        Self(value)
    }
}

impl From<U256> for SqrtPriceX96 {
    fn from(value: U256) -> Self {
        Self(value.saturating_to::<U160>())
    }
}

impl From<SqrtPriceX96> for U256 {
    fn from(value: SqrtPriceX96) -> Self {
        U256::from(value.0)
    }
}

impl From<SqrtPriceX96> for U160 {
    fn from(value: SqrtPriceX96) -> Self {
        value.0
    }
}
