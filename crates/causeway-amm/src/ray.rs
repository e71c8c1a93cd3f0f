use std::{ops::Deref, sync::OnceLock};

use alloy::primitives::{U256, U512, Uint, aliases::U320};
use alloy_primitives::U160;
use malachite::{
    Natural, Rational,
    num::{
        arithmetic::traits::{DivRound, PowerOf2},
        conversion::traits::{FromSciString, RoundingInto}
    },
    rounding_modes::RoundingMode
};
use serde::{Deserialize, Serialize};

use crate::sqrt_pricex96::SqrtPriceX96;

pub fn const_1e27() -> &'static Natural {
    static TWENTYSEVEN: OnceLock<Natural> = OnceLock::new();
    TWENTYSEVEN.get_or_init(|| Natural::from_sci_string("1e27").unwrap())
}

pub fn const_2_192() -> &'static Natural {
    static ONENINETWO: OnceLock<Natural> = OnceLock::new();
    ONENINETWO.get_or_init(|| Natural::power_of_2(192))
}

/// 1e27 fixed-point price used on the read-only quote surface.
#[derive(Copy, Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ray(pub U256);

impl Deref for Ray {
    type Target = U256;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq<U256> for Ray {
    fn eq(&self, other: &U256) -> bool {
        self.0.eq(other)
    }
}

impl From<U256> for Ray {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl From<u128> for Ray {
    fn from(value: u128) -> Self {
        Self(U256::from(value))
    }
}

impl From<Ray> for U256 {
    fn from(value: Ray) -> Self {
        value.0
    }
}

impl From<Ray> for Natural {
    fn from(value: Ray) -> Self {
        Natural::from_limbs_asc(value.0.as_limbs())
    }
}

impl From<&Ray> for f64 {
    fn from(value: &Ray) -> Self {
        let numerator = Natural::from_limbs_asc(value.0.as_limbs());
        let price = Rational::from_naturals(numerator, const_1e27().clone());
        price.rounding_into(RoundingMode::Floor).0
    }
}

/// Squares the sqrt price and rescales 2^192 -> 1e27.
fn convert_sqrtpricex96(price: &U160, round_up: bool) -> Ray {
    let p: U320 = price.widening_mul(*price);
    let rm = if round_up { RoundingMode::Ceiling } else { RoundingMode::Floor };
    let numerator = Natural::from_limbs_asc(p.as_limbs()) * const_1e27();
    let (res, _) = numerator.div_round(const_2_192(), rm);
    Ray(U256::from_limbs_slice(&res.into_limbs_asc()))
}

impl From<&SqrtPriceX96> for Ray {
    fn from(price: &SqrtPriceX96) -> Self {
        convert_sqrtpricex96(price, false)
    }
}

impl From<SqrtPriceX96> for Ray {
    fn from(price: SqrtPriceX96) -> Self {
        convert_sqrtpricex96(&price, false)
    }
}

impl Serialize for Ray {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Ray {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>
    {
        let inner = U256::deserialize(deserializer)?;
        Ok(Self(inner))
    }
}

impl Ray {
    pub const ZERO: Ray = Ray(U256::ZERO);

    /// Calculates a price ratio t1/t0, rounding up.
    pub fn calc_price(t0: U256, t1: U256) -> Self {
        let t0 = Natural::from_limbs_asc(t0.as_limbs());
        let t1 = Natural::from_limbs_asc(t1.as_limbs());
        let output = (t1 * const_1e27()).div_round(t0, RoundingMode::Ceiling).0;
        Self(U256::from_limbs_slice(&output.into_limbs_asc()))
    }

    /// Given a price ratio t1/t0, how much t1 the provided amount of t0 (q)
    /// is worth. Rounds down.
    pub fn mul_quantity(&self, q: U256) -> U256 {
        let p: U512 = self.0.widening_mul(q);
        let numerator = Natural::from_limbs_asc(p.as_limbs());
        let (res, _) = numerator.div_round(const_1e27(), RoundingMode::Floor);
        Uint::from_limbs_slice(&res.into_limbs_asc())
    }

    /// Approximates this value as a floating point number. Lossy.
    pub fn as_f64(&self) -> f64 {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_sqrt_price_is_one_ray() {
        let unit = SqrtPriceX96::from(U256::from(1u8) << 96);
        let ray = Ray::from(unit);
        assert_eq!(ray, U256::from(10u8).pow(U256::from(27u8)));
    }

    #[test]
    fn calc_price_is_a_plain_ratio() {
        let price = Ray::calc_price(U256::from(2u8), U256::from(6u8));
        assert_eq!(price, U256::from(3u8) * U256::from(10u8).pow(U256::from(27u8)));
        assert_eq!(price.mul_quantity(U256::from(100u8)), U256::from(300u16));
    }

    #[test]
    fn as_f64_tracks_the_ratio() {
        let price = Ray::calc_price(U256::from(4u8), U256::from(1u8));
        assert!((price.as_f64() - 0.25).abs() < 1e-12);
    }
}
