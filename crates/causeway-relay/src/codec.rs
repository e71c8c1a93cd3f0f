//! Wire format for cross-chain liquidity intents. ABI encoding keeps the
//! payload readable by the solidity side of the bridge.

use alloy::sol_types::SolValue;
use alloy_primitives::Bytes;
use thiserror::Error;

alloy::sol!(
    #[derive(Copy, Debug, PartialEq, Eq)]
    struct LiquidityEnvelope {
        /// @notice position owner on both sides of the bridge
        address user;
        address baseToken;
        address quoteToken;
        /// @notice deposit amounts, zero for removals
        uint256 amount0;
        uint256 amount1;
        int32   lowerTick;
        int32   upperTick;
        /// @notice liquidity to burn, zero for adds
        uint128 liquidity;
        /// @notice destination range slot the burn addresses, zero for adds
        uint64  rangeSlot;
        /// @notice advisory only, receivers trust the transport origin instead
        uint64  sourceChainId;
        bool    isAdd;
    }
);

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("envelope decode failed: {0}")]
    Decode(#[from] alloy::sol_types::Error)
}

impl LiquidityEnvelope {
    pub fn encode(&self) -> Bytes {
        self.abi_encode().into()
    }

    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        Ok(Self::abi_decode(data)?)
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{Address, U256};

    use super::*;

    #[test]
    fn envelopes_round_trip_the_wire() {
        let envelope = LiquidityEnvelope {
            user:          Address::repeat_byte(0x01),
            baseToken:     Address::repeat_byte(0x02),
            quoteToken:    Address::repeat_byte(0x03),
            amount0:       U256::from(1_000u64),
            amount1:       U256::from(2_000u64),
            lowerTick:     -887_220,
            upperTick:     887_220,
            liquidity:     0,
            rangeSlot:     0,
            sourceChainId: 31_337,
            isAdd:         true
        };

        let decoded = LiquidityEnvelope::decode(&envelope.encode()).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn truncated_payloads_are_rejected() {
        let envelope = LiquidityEnvelope {
            user:          Address::ZERO,
            baseToken:     Address::ZERO,
            quoteToken:    Address::ZERO,
            amount0:       U256::ZERO,
            amount1:       U256::ZERO,
            lowerTick:     0,
            upperTick:     0,
            liquidity:     10,
            rangeSlot:     3,
            sourceChainId: 1,
            isAdd:         false
        };

        let bytes = envelope.encode();
        assert!(LiquidityEnvelope::decode(&bytes[..bytes.len() - 8]).is_err());
        assert!(LiquidityEnvelope::decode(&[]).is_err());
    }
}
