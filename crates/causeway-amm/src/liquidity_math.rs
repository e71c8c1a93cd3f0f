//! Conversions between token amounts and range liquidity on Q64.96 sqrt
//! prices. Rounding always favors the pool: liquidity rounds down, amounts
//! taken round up, amounts paid out round down.

use alloy::primitives::U256;
use uniswap_v3_math::{
    error::UniswapV3MathError,
    full_math::{mul_div, mul_div_rounding_up}
};

const Q96: U256 = U256::from_limbs([0, 0x1_0000_0000, 0, 0]);
const U256_1: U256 = U256::from_limbs([1, 0, 0, 0]);

fn div_rounding_up(a: U256, b: U256) -> U256 {
    let (quot, rem) = a.div_rem(b);
    if rem.is_zero() { quot } else { quot + U256_1 }
}

fn sort(sqrt_ratio_a: U256, sqrt_ratio_b: U256) -> (U256, U256) {
    if sqrt_ratio_a > sqrt_ratio_b { (sqrt_ratio_b, sqrt_ratio_a) } else { (sqrt_ratio_a, sqrt_ratio_b) }
}

/// Liquidity purchasable with `amount0` across [sqrt_a, sqrt_b].
pub fn liquidity_for_amount0(
    sqrt_ratio_a: U256,
    sqrt_ratio_b: U256,
    amount0: U256
) -> Result<U256, UniswapV3MathError> {
    let (sqrt_a, sqrt_b) = sort(sqrt_ratio_a, sqrt_ratio_b);
    let intermediate = mul_div(sqrt_a, sqrt_b, Q96)?;
    mul_div(amount0, intermediate, sqrt_b - sqrt_a)
}

/// Liquidity purchasable with `amount1` across [sqrt_a, sqrt_b].
pub fn liquidity_for_amount1(
    sqrt_ratio_a: U256,
    sqrt_ratio_b: U256,
    amount1: U256
) -> Result<U256, UniswapV3MathError> {
    let (sqrt_a, sqrt_b) = sort(sqrt_ratio_a, sqrt_ratio_b);
    mul_div(amount1, Q96, sqrt_b - sqrt_a)
}

/// Maximum liquidity both amounts can back at the current price. Inside the
/// range this is the min of the two single-sided results; outside, only the
/// covering token counts.
pub fn liquidity_for_amounts(
    sqrt_price: U256,
    sqrt_ratio_a: U256,
    sqrt_ratio_b: U256,
    amount0: U256,
    amount1: U256
) -> Result<U256, UniswapV3MathError> {
    let (sqrt_a, sqrt_b) = sort(sqrt_ratio_a, sqrt_ratio_b);

    if sqrt_price <= sqrt_a {
        liquidity_for_amount0(sqrt_a, sqrt_b, amount0)
    } else if sqrt_price < sqrt_b {
        let liquidity0 = liquidity_for_amount0(sqrt_price, sqrt_b, amount0)?;
        let liquidity1 = liquidity_for_amount1(sqrt_a, sqrt_price, amount1)?;
        Ok(liquidity0.min(liquidity1))
    } else {
        liquidity_for_amount1(sqrt_a, sqrt_b, amount1)
    }
}

/// Token0 owed for `liquidity` across [sqrt_a, sqrt_b].
pub fn amount0_for_liquidity(
    sqrt_ratio_a: U256,
    sqrt_ratio_b: U256,
    liquidity: u128,
    round_up: bool
) -> Result<U256, UniswapV3MathError> {
    let (sqrt_a, sqrt_b) = sort(sqrt_ratio_a, sqrt_ratio_b);
    let numerator1 = U256::from(liquidity) << 96;
    let numerator2 = sqrt_b - sqrt_a;

    if round_up {
        Ok(div_rounding_up(mul_div_rounding_up(numerator1, numerator2, sqrt_b)?, sqrt_a))
    } else {
        Ok(mul_div(numerator1, numerator2, sqrt_b)? / sqrt_a)
    }
}

/// Token1 owed for `liquidity` across [sqrt_a, sqrt_b].
pub fn amount1_for_liquidity(
    sqrt_ratio_a: U256,
    sqrt_ratio_b: U256,
    liquidity: u128,
    round_up: bool
) -> Result<U256, UniswapV3MathError> {
    let (sqrt_a, sqrt_b) = sort(sqrt_ratio_a, sqrt_ratio_b);

    if round_up {
        mul_div_rounding_up(U256::from(liquidity), sqrt_b - sqrt_a, Q96)
    } else {
        mul_div(U256::from(liquidity), sqrt_b - sqrt_a, Q96)
    }
}

/// Both token amounts backing `liquidity` at the current price.
pub fn amounts_for_liquidity(
    sqrt_price: U256,
    sqrt_ratio_a: U256,
    sqrt_ratio_b: U256,
    liquidity: u128,
    round_up: bool
) -> Result<(U256, U256), UniswapV3MathError> {
    let (sqrt_a, sqrt_b) = sort(sqrt_ratio_a, sqrt_ratio_b);

    if sqrt_price <= sqrt_a {
        Ok((amount0_for_liquidity(sqrt_a, sqrt_b, liquidity, round_up)?, U256::ZERO))
    } else if sqrt_price < sqrt_b {
        Ok((
            amount0_for_liquidity(sqrt_price, sqrt_b, liquidity, round_up)?,
            amount1_for_liquidity(sqrt_a, sqrt_price, liquidity, round_up)?
        ))
    } else {
        Ok((U256::ZERO, amount1_for_liquidity(sqrt_a, sqrt_b, liquidity, round_up)?))
    }
}
