//! Deployment configuration for one chain's exchange.

use alloy_primitives::Address;
use causeway_common::ChainId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fee rates are capped at 10%.
pub const MAX_FEE_BPS: u16 = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("operator cannot be the zero address")]
    InvalidOperator,
    #[error("default fee recipient cannot be the zero address")]
    InvalidFeeRecipient,
    #[error("fee of {0} bps exceeds the {MAX_FEE_BPS} bps cap")]
    FeeTooHigh(u16)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    pub chain_id:              ChainId,
    pub operator:              Address,
    pub default_fee_bps:       u16,
    pub default_fee_recipient: Address,
    pub default_stable_pair:   bool
}

impl ExchangeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.operator == Address::ZERO {
            return Err(ConfigError::InvalidOperator);
        }
        if self.default_fee_recipient == Address::ZERO {
            return Err(ConfigError::InvalidFeeRecipient);
        }
        if self.default_fee_bps > MAX_FEE_BPS {
            return Err(ConfigError::FeeTooHigh(self.default_fee_bps));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ExchangeConfig {
        ExchangeConfig {
            chain_id:              1,
            operator:              Address::repeat_byte(0x0f),
            default_fee_bps:       30,
            default_fee_recipient: Address::repeat_byte(0xfe),
            default_stable_pair:   false
        }
    }

    #[test]
    fn a_sane_config_validates() {
        config().validate().unwrap();
    }

    #[test]
    fn fee_cap_is_inclusive() {
        let mut cfg = config();
        cfg.default_fee_bps = MAX_FEE_BPS;
        cfg.validate().unwrap();

        cfg.default_fee_bps = MAX_FEE_BPS + 1;
        assert!(matches!(cfg.validate(), Err(ConfigError::FeeTooHigh(_))));
    }

    #[test]
    fn zero_addresses_are_rejected() {
        let mut cfg = config();
        cfg.operator = Address::ZERO;
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidOperator)));

        let mut cfg = config();
        cfg.default_fee_recipient = Address::ZERO;
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidFeeRecipient)));
    }

    #[test]
    fn configs_round_trip_through_serde() {
        let json = serde_json::to_string(&config()).unwrap();
        let restored: ExchangeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.chain_id, 1);
        assert_eq!(restored.operator, Address::repeat_byte(0x0f));
    }
}
