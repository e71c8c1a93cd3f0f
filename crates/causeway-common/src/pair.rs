use alloy::sol_types::SolValue;
use alloy_primitives::{Address, keccak256};
use serde::{Deserialize, Serialize};

use crate::PoolId;

alloy::sol!(
    #[derive(Copy, Debug, Hash, PartialEq, Eq, Ord, PartialOrd, Serialize, Deserialize)]
    struct PairKey {
        /// @notice token the pool is denominated in
        address base;
        /// @notice token the pool trades the base against
        address quote;
    }
);

/// Pair identity is the hash of the ordered pair, (base, quote) and
/// (quote, base) are two different pools.
impl From<PairKey> for PoolId {
    fn from(value: PairKey) -> Self {
        keccak256(value.abi_encode())
    }
}

const LP_SHARE_DOMAIN: &[u8] = b"causeway/lp-share";

/// Deterministic address of the share token a pool mints to its range
/// holders. Doubles as the pool's vault account in the bank.
pub fn lp_token_address(pool_id: PoolId) -> Address {
    let mut preimage = Vec::with_capacity(LP_SHARE_DOMAIN.len() + 32);
    preimage.extend_from_slice(LP_SHARE_DOMAIN);
    preimage.extend_from_slice(pool_id.as_slice());

    Address::from_slice(&keccak256(preimage)[12..])
}
