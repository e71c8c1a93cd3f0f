use alloy_primitives::{Address, U256};
use auto_impl::auto_impl;
use causeway_common::{ChainId, PoolId};

use crate::codec::LiquidityEnvelope;

/// What a remote add settled into on the destination book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteAddOutcome {
    pub pool:       PoolId,
    pub liquidity:  u128,
    pub amount0:    U256,
    pub amount1:    U256,
    pub range_slot: u64
}

/// What a remote remove drained from the destination book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteRemoveOutcome {
    pub pool:      PoolId,
    pub liquidity: u128,
    pub amount0:   U256,
    pub amount1:   U256
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("no active pool for the requested pair")]
    PoolNotFound,
    #[error("insufficient {token} balance: need {need}, have {have}")]
    InsufficientBalance { token: Address, need: U256, have: U256 },
    #[error("deposit resolves to zero liquidity")]
    ZeroLiquidity,
    #[error("no range stake under slot {0}")]
    RangeNotFound(u64),
    #[error("stake cannot cover the requested liquidity")]
    InsufficientLiquidity,
    #[error("{0}")]
    Rejected(String)
}

/// Funds custody and pool mutation, supplied by whoever embeds the relay.
///
/// The relay never touches balances or pool state directly. Everything it
/// needs from the venue goes through this port, so the message flow can be
/// exercised against a mock just as well as against the live exchange.
#[auto_impl(Arc)]
#[cfg_attr(test, mockall::automock)]
pub trait LiquidityHost: Send + Sync + 'static {
    /// Resolves the active pool for an ordered pair.
    /// Returns: (pool_id, token0, token1)
    fn pool_tokens(&self, base: Address, quote: Address)
    -> Result<(PoolId, Address, Address), HostError>;

    /// Moves user funds into escrow custody ahead of an outbound send.
    fn escrow_deposit(
        &self,
        user: Address,
        token0: Address,
        token1: Address,
        amount0: U256,
        amount1: U256
    ) -> Result<(), HostError>;

    /// Hands escrowed funds back out of custody.
    fn release_escrow(
        &self,
        to: Address,
        token0: Address,
        token1: Address,
        amount0: U256,
        amount1: U256
    ) -> Result<(), HostError>;

    /// Collects the transport fee from the payer's native balance.
    fn charge_message_fee(&self, payer: Address, amount: U256) -> Result<(), HostError>;

    /// Returns a previously collected transport fee.
    fn refund_message_fee(&self, payer: Address, amount: U256) -> Result<(), HostError>;

    /// Settles an inbound add against the local book.
    fn apply_remote_add(
        &self,
        src_chain: ChainId,
        envelope: LiquidityEnvelope
    ) -> Result<RemoteAddOutcome, HostError>;

    /// Settles an inbound remove against the local book.
    fn apply_remote_remove(
        &self,
        src_chain: ChainId,
        envelope: LiquidityEnvelope
    ) -> Result<RemoteRemoveOutcome, HostError>;
}
