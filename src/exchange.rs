//! The exchange facade: admin surface, local liquidity and swap entry
//! points, and the [`LiquidityHost`] adapter the cross-chain relay drives.
//!
//! Every state-mutating entry point follows the same shape: resolve and
//! validate first, claim the pool's entry guard, commit pool/range/share
//! state, and only then move bank balances. A failure before the commit
//! leaves nothing changed.

use std::sync::{Arc, RwLock};

use alloy_primitives::{Address, U256, keccak256};
use causeway_amm::{AmmError, PoolState, RangeQuote, pool_swap::SwapError, ray::Ray, tick_info::Tick, tick_spacing_for};
use causeway_common::{ChainId, EventJournal, ExchangeEvent, PoolId, Pools, RangeBook};
use causeway_relay::{
    HostError, LiquidityEnvelope, LiquidityHost, RemoteAddOutcome, RemoteRemoveOutcome
};
use dashmap::DashMap;
use thiserror::Error;

use crate::{
    bank::{BankError, NATIVE, TokenBank},
    config::{ConfigError, ExchangeConfig, MAX_FEE_BPS},
    guard::EntryGuard,
    lp_ledger::{LedgerError, LpLedger},
    registry::{PoolMeta, PoolRegistry, RegistryError}
};

const ESCROW_DOMAIN: &[u8] = b"causeway/relay-escrow";

/// Custody account holding funds escrowed for in-flight cross-chain adds.
pub fn relay_vault() -> Address {
    Address::from_slice(&keccak256(ESCROW_DOMAIN)[12..])
}

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("caller is not the exchange operator")]
    Unauthorized,
    #[error("pool is busy with another entry")]
    Reentrant,
    #[error("no active pool for this pair")]
    PoolNotFound,
    #[error("token {0} is not part of this pool's pair")]
    UnknownToken(Address),
    #[error("fee of {0} bps exceeds the {MAX_FEE_BPS} bps cap")]
    FeeTooHigh(u16),
    #[error("fee recipient cannot be the zero address")]
    InvalidFeeRecipient,
    #[error("caller holds no ranges in this pool")]
    NoRanges,
    #[error("swap output {got} is below the requested minimum {want}")]
    SlippageExceeded { want: U256, got: U256 },
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Amm(#[from] AmmError),
    #[error(transparent)]
    Swap(#[from] SwapError),
    #[error(transparent)]
    Bank(#[from] BankError),
    #[error(transparent)]
    Ledger(#[from] LedgerError)
}

/// Operator-tunable defaults applied when pool creation omits a value.
struct Defaults {
    fee_bps:       u16,
    fee_recipient: Address,
    stable_pair:   bool
}

pub struct Exchange {
    chain_id: ChainId,
    operator: Address,
    defaults: RwLock<Defaults>,
    pools:    Pools,
    registry: PoolRegistry,
    bank:     TokenBank,
    ledgers:  DashMap<PoolId, Arc<LpLedger>>,
    ranges:   RangeBook,
    journal:  Arc<EventJournal>,
    guard:    EntryGuard
}

impl Exchange {
    pub fn new(config: ExchangeConfig, journal: Arc<EventJournal>) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            chain_id: config.chain_id,
            operator: config.operator,
            defaults: RwLock::new(Defaults {
                fee_bps:       config.default_fee_bps,
                fee_recipient: config.default_fee_recipient,
                stable_pair:   config.default_stable_pair
            }),
            pools: Pools::new(),
            registry: PoolRegistry::new(),
            bank: TokenBank::new(),
            ledgers: DashMap::default(),
            ranges: RangeBook::new(),
            journal,
            guard: EntryGuard::new()
        })
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn operator(&self) -> Address {
        self.operator
    }

    pub fn bank(&self) -> &TokenBank {
        &self.bank
    }

    pub fn pools(&self) -> &Pools {
        &self.pools
    }

    pub fn registry(&self) -> &PoolRegistry {
        &self.registry
    }

    pub fn journal(&self) -> &EventJournal {
        &self.journal
    }

    // --- admin surface ---------------------------------------------------

    /// Creates a pool for the ordered pair and binds its fresh share ledger.
    /// `fee_recipient`/`stable_pair` fall back to the configured defaults.
    #[allow(clippy::too_many_arguments)]
    pub fn create_pool(
        &self,
        caller: Address,
        base: Address,
        quote: Address,
        name: String,
        symbol: String,
        fee_recipient: Option<Address>,
        stable_pair: Option<bool>
    ) -> Result<PoolId, ExchangeError> {
        self.ensure_operator(caller)?;

        let (fee_bps, fee_recipient, stable_pair) = {
            let defaults = self.defaults.read().expect("defaults lock poisoned");
            (
                defaults.fee_bps,
                fee_recipient.unwrap_or(defaults.fee_recipient),
                stable_pair.unwrap_or(defaults.stable_pair)
            )
        };

        let (pool_id, meta) =
            self.registry
                .create(base, quote, name, symbol, fee_bps, fee_recipient, stable_pair)?;

        self.pools
            .insert(pool_id, PoolState::new(tick_spacing_for(stable_pair)));

        // construct unbound, bind once. Re-creation of a deactivated pair
        // gets a fresh ledger; the old one stays with the dead pool.
        let ledger = Arc::new(LpLedger::new());
        ledger.bind(pool_id)?;
        self.ledgers.insert(pool_id, ledger);

        tracing::info!(pool = %pool_id, %base, %quote, fee_bps, "pool created");
        self.journal.record(ExchangeEvent::PoolCreated {
            pool: pool_id,
            base,
            quote,
            name: meta.name,
            symbol: meta.symbol,
            fee_recipient,
            stable_pair,
            lp_token: meta.lp_token
        });
        self.pools.publish();

        Ok(pool_id)
    }

    /// Terminal: a deactivated pool never serves another mutation.
    pub fn deactivate_pool(
        &self,
        caller: Address,
        base: Address,
        quote: Address
    ) -> Result<(), ExchangeError> {
        self.ensure_operator(caller)?;
        self.registry.deactivate(base, quote)?;

        let pool_id: PoolId = causeway_common::PairKey { base, quote }.into();
        tracing::info!(pool = %pool_id, "pool deactivated");
        self.journal
            .record(ExchangeEvent::PoolDeactivated { pool: pool_id, base, quote });
        self.pools.publish();

        Ok(())
    }

    pub fn set_default_fee_bps(&self, caller: Address, fee_bps: u16) -> Result<(), ExchangeError> {
        self.ensure_operator(caller)?;
        if fee_bps > MAX_FEE_BPS {
            return Err(ExchangeError::FeeTooHigh(fee_bps));
        }
        self.defaults.write().expect("defaults lock poisoned").fee_bps = fee_bps;
        Ok(())
    }

    pub fn set_default_fee_recipient(
        &self,
        caller: Address,
        recipient: Address
    ) -> Result<(), ExchangeError> {
        self.ensure_operator(caller)?;
        if recipient == Address::ZERO {
            return Err(ExchangeError::InvalidFeeRecipient);
        }
        self.defaults
            .write()
            .expect("defaults lock poisoned")
            .fee_recipient = recipient;
        Ok(())
    }

    pub fn set_default_stable_pair(&self, caller: Address, stable: bool) -> Result<(), ExchangeError> {
        self.ensure_operator(caller)?;
        self.defaults
            .write()
            .expect("defaults lock poisoned")
            .stable_pair = stable;
        Ok(())
    }

    // --- user surface ----------------------------------------------------

    /// Deposits into `[lower, upper)`. Only the amounts the computed
    /// liquidity actually needs are taken; returns the range slot and the
    /// liquidity bought.
    #[allow(clippy::too_many_arguments)]
    pub fn add_liquidity(
        &self,
        caller: Address,
        base: Address,
        quote: Address,
        amount0: U256,
        amount1: U256,
        lower_tick: Tick,
        upper_tick: Tick
    ) -> Result<(u64, u128), ExchangeError> {
        let (pool_id, meta) = self.active_meta(base, quote)?;
        let _claim = self.guard.claim(pool_id).ok_or(ExchangeError::Reentrant)?;

        let (slot, priced) =
            self.add_liquidity_inner(pool_id, &meta, caller, amount0, amount1, lower_tick, upper_tick)?;
        Ok((slot, priced.liquidity))
    }

    /// Burns `liquidity` out of the caller's `slot`, paying out what the
    /// removed liquidity is worth at the current price.
    pub fn remove_liquidity(
        &self,
        caller: Address,
        base: Address,
        quote: Address,
        liquidity: u128,
        slot: u64
    ) -> Result<(U256, U256), ExchangeError> {
        let (pool_id, meta) = self.active_meta(base, quote)?;
        let _claim = self.guard.claim(pool_id).ok_or(ExchangeError::Reentrant)?;

        let priced = self.remove_liquidity_inner(pool_id, &meta, caller, liquidity, slot)?;
        Ok((priced.amount0, priced.amount1))
    }

    /// Exact-input swap. The protocol fee is skimmed off the input before
    /// the tick walk; the whole call fails if the walk cannot consume the
    /// post-fee input or the output misses `min_amount_out`.
    #[allow(clippy::too_many_arguments)]
    pub fn swap(
        &self,
        caller: Address,
        base: Address,
        quote: Address,
        token_in: Address,
        amount_in: U256,
        min_amount_out: U256
    ) -> Result<U256, ExchangeError> {
        let (pool_id, meta) = self.active_meta(base, quote)?;
        let _claim = self.guard.claim(pool_id).ok_or(ExchangeError::Reentrant)?;

        let zero_for_one = if token_in == base {
            true
        } else if token_in == quote {
            false
        } else {
            return Err(ExchangeError::UnknownToken(token_in));
        };
        let token_out = if zero_for_one { quote } else { base };

        let fee = amount_in
            .checked_mul(U256::from(meta.fee_bps))
            .ok_or(SwapError::AmountTooLarge)?
            / U256::from(10_000u64);
        let net_in = amount_in - fee;

        let result = {
            let pool = self
                .pools
                .get_pool(&pool_id)
                .ok_or(ExchangeError::PoolNotFound)?;
            pool.quote_swap(zero_for_one, net_in)?
        };
        if result.amount_out < min_amount_out {
            return Err(ExchangeError::SlippageExceeded {
                want: min_amount_out,
                got:  result.amount_out
            });
        }

        let have = self.bank.balance(token_in, caller);
        if have < amount_in {
            return Err(BankError::InsufficientBalance {
                token: token_in,
                holder: caller,
                need: amount_in,
                have
            }
            .into());
        }

        self.pools
            .update_pool(&pool_id, |state| state.commit_swap(&result))
            .ok_or(ExchangeError::PoolNotFound)?;

        self.bank.transfer(token_in, caller, meta.lp_token, net_in)?;
        self.bank.transfer(token_in, caller, meta.fee_recipient, fee)?;
        self.bank
            .transfer(token_out, meta.lp_token, caller, result.amount_out)?;

        tracing::debug!(
            pool = %pool_id,
            %amount_in,
            amount_out = %result.amount_out,
            %fee,
            end_tick = result.end_tick,
            "swap executed"
        );
        self.journal.record(ExchangeEvent::SwapExecuted {
            pool: pool_id,
            user: caller,
            token_in,
            token_out,
            amount_in,
            amount_out: result.amount_out,
            fee,
            end_tick: result.end_tick
        });
        self.pools.publish();

        Ok(result.amount_out)
    }

    // --- read surface ----------------------------------------------------

    pub fn pool_meta(&self, base: Address, quote: Address) -> Option<PoolMeta> {
        self.registry.by_pair(base, quote).map(|(_, meta)| meta)
    }

    pub fn list_pools(&self) -> Vec<(PoolId, PoolMeta)> {
        self.registry.iter()
    }

    pub fn user_ranges(
        &self,
        base: Address,
        quote: Address,
        user: Address
    ) -> Vec<(u64, causeway_amm::range::RangeStake)> {
        let pool_id: PoolId = causeway_common::PairKey { base, quote }.into();
        self.ranges.ranges(pool_id, user)
    }

    /// Same math as [`Exchange::swap`], no mutation, no transfers.
    pub fn quote_swap(
        &self,
        base: Address,
        quote: Address,
        token_in: Address,
        amount_in: U256
    ) -> Result<U256, ExchangeError> {
        let (pool_id, meta) = self.active_meta(base, quote)?;
        let zero_for_one = if token_in == base {
            true
        } else if token_in == quote {
            false
        } else {
            return Err(ExchangeError::UnknownToken(token_in));
        };

        let fee = amount_in
            .checked_mul(U256::from(meta.fee_bps))
            .ok_or(SwapError::AmountTooLarge)?
            / U256::from(10_000u64);
        let pool = self
            .pools
            .get_pool(&pool_id)
            .ok_or(ExchangeError::PoolNotFound)?;
        Ok(pool.quote_swap(zero_for_one, amount_in - fee)?.amount_out)
    }

    /// Mid price of the pair as quote-per-base, in ray units.
    pub fn mid_price(&self, base: Address, quote: Address) -> Option<Ray> {
        let pool_id: PoolId = causeway_common::PairKey { base, quote }.into();
        self.pools.get_pool(&pool_id).map(|pool| pool.ray_price())
    }

    pub fn lp_balance(&self, base: Address, quote: Address, holder: Address) -> U256 {
        let pool_id: PoolId = causeway_common::PairKey { base, quote }.into();
        self.ledgers
            .get(&pool_id)
            .map(|ledger| ledger.balance_of(holder))
            .unwrap_or_default()
    }

    pub fn lp_supply(&self, base: Address, quote: Address) -> U256 {
        let pool_id: PoolId = causeway_common::PairKey { base, quote }.into();
        self.ledgers
            .get(&pool_id)
            .map(|ledger| ledger.total_supply())
            .unwrap_or_default()
    }

    pub fn share_ledger(&self, pool_id: &PoolId) -> Option<Arc<LpLedger>> {
        self.ledgers.get(pool_id).map(|ledger| Arc::clone(&ledger))
    }

    // --- internals -------------------------------------------------------

    fn ensure_operator(&self, caller: Address) -> Result<(), ExchangeError> {
        if caller != self.operator {
            return Err(ExchangeError::Unauthorized);
        }
        Ok(())
    }

    fn active_meta(&self, base: Address, quote: Address) -> Result<(PoolId, PoolMeta), ExchangeError> {
        self.registry
            .active(base, quote)
            .map_err(|_| ExchangeError::PoolNotFound)
    }

    fn ledger(&self, pool_id: &PoolId) -> Result<Arc<LpLedger>, ExchangeError> {
        self.ledgers
            .get(pool_id)
            .map(|ledger| Arc::clone(&ledger))
            .ok_or(ExchangeError::PoolNotFound)
    }

    /// Shared body of local and cross-chain adds. Caller holds the pool's
    /// entry claim.
    #[allow(clippy::too_many_arguments)]
    fn add_liquidity_inner(
        &self,
        pool_id: PoolId,
        meta: &PoolMeta,
        user: Address,
        amount0: U256,
        amount1: U256,
        lower_tick: Tick,
        upper_tick: Tick
    ) -> Result<(u64, RangeQuote), ExchangeError> {
        let ledger = self.ledger(&pool_id)?;

        let priced = {
            let pool = self
                .pools
                .get_pool(&pool_id)
                .ok_or(ExchangeError::PoolNotFound)?;
            pool.quote_add(amount0, amount1, lower_tick, upper_tick)?
        };

        for (token, need) in [(meta.pair.base, priced.amount0), (meta.pair.quote, priced.amount1)] {
            let have = self.bank.balance(token, user);
            if have < need {
                return Err(BankError::InsufficientBalance { token, holder: user, need, have }.into());
            }
        }

        self.pools
            .update_pool(&pool_id, |state| state.commit_add(&priced))
            .ok_or(ExchangeError::PoolNotFound)??;
        let slot = self
            .ranges
            .grow(pool_id, user, priced.lower_tick, priced.upper_tick, priced.liquidity);
        ledger.mint(pool_id, user, U256::from(priced.liquidity))?;

        self.bank
            .transfer(meta.pair.base, user, meta.lp_token, priced.amount0)?;
        self.bank
            .transfer(meta.pair.quote, user, meta.lp_token, priced.amount1)?;

        tracing::debug!(pool = %pool_id, %user, slot, liquidity = priced.liquidity, "liquidity added");
        self.journal.record(ExchangeEvent::RangeAdded {
            pool: pool_id,
            user,
            slot,
            lower_tick: priced.lower_tick,
            upper_tick: priced.upper_tick,
            liquidity: priced.liquidity
        });
        self.journal.record(ExchangeEvent::LiquidityAdded {
            pool: pool_id,
            user,
            amount0: priced.amount0,
            amount1: priced.amount1,
            liquidity: priced.liquidity
        });
        self.pools.publish();

        Ok((slot, priced))
    }

    /// Shared body of local and cross-chain removes. Caller holds the
    /// pool's entry claim.
    fn remove_liquidity_inner(
        &self,
        pool_id: PoolId,
        meta: &PoolMeta,
        user: Address,
        liquidity: u128,
        slot: u64
    ) -> Result<RangeQuote, ExchangeError> {
        if !self.ranges.has_ranges(pool_id, user) {
            return Err(ExchangeError::NoRanges);
        }
        let stake = self
            .ranges
            .get(pool_id, user, slot)
            .ok_or(AmmError::RangeSlotMissing(slot))?;
        if liquidity > stake.liquidity {
            return Err(AmmError::RangeLiquidityExceeded {
                slot,
                have: stake.liquidity,
                want: liquidity
            }
            .into());
        }
        let ledger = self.ledger(&pool_id)?;
        // shares are freely transferable, so the stake alone does not prove
        // the caller can still pay the burn. Check before anything commits.
        let shares = ledger.balance_of(user);
        if shares < U256::from(liquidity) {
            return Err(LedgerError::InsufficientShares {
                holder: user,
                need:   U256::from(liquidity),
                have:   shares
            }
            .into());
        }

        let priced = {
            let pool = self
                .pools
                .get_pool(&pool_id)
                .ok_or(ExchangeError::PoolNotFound)?;
            pool.quote_remove(stake.lower_tick, stake.upper_tick, liquidity)?
        };

        self.ranges.shrink(pool_id, user, slot, liquidity)?;
        self.pools
            .update_pool(&pool_id, |state| state.commit_remove(&priced))
            .ok_or(ExchangeError::PoolNotFound)??;
        ledger.burn(pool_id, user, U256::from(liquidity))?;

        self.bank
            .transfer(meta.pair.base, meta.lp_token, user, priced.amount0)?;
        self.bank
            .transfer(meta.pair.quote, meta.lp_token, user, priced.amount1)?;

        tracing::debug!(pool = %pool_id, %user, slot, liquidity, "liquidity removed");
        self.journal.record(ExchangeEvent::RangeRemoved {
            pool: pool_id,
            user,
            slot,
            lower_tick: stake.lower_tick,
            upper_tick: stake.upper_tick,
            liquidity
        });
        self.journal.record(ExchangeEvent::LiquidityRemoved {
            pool: pool_id,
            user,
            amount0: priced.amount0,
            amount1: priced.amount1,
            liquidity
        });
        self.pools.publish();

        Ok(priced)
    }

    fn remote_meta(&self, base: Address, quote: Address) -> Result<(PoolId, PoolMeta), HostError> {
        let (pool_id, meta) = self
            .registry
            .by_pair(base, quote)
            .ok_or(HostError::PoolNotFound)?;
        if !meta.active {
            return Err(HostError::Rejected("pool inactive".into()));
        }
        Ok((pool_id, meta))
    }
}

fn host_error(err: ExchangeError) -> HostError {
    match err {
        ExchangeError::PoolNotFound => HostError::PoolNotFound,
        ExchangeError::NoRanges => HostError::RangeNotFound(0),
        ExchangeError::Amm(AmmError::ZeroLiquidity) => HostError::ZeroLiquidity,
        ExchangeError::Amm(AmmError::RangeSlotMissing(slot)) => HostError::RangeNotFound(slot),
        ExchangeError::Amm(AmmError::RangeLiquidityExceeded { .. }) => {
            HostError::InsufficientLiquidity
        }
        ExchangeError::Bank(BankError::InsufficientBalance { token, need, have, .. }) => {
            HostError::InsufficientBalance { token, need, have }
        }
        other => HostError::Rejected(other.to_string())
    }
}

impl LiquidityHost for Exchange {
    fn pool_tokens(
        &self,
        base: Address,
        quote: Address
    ) -> Result<(PoolId, Address, Address), HostError> {
        let (pool_id, _) = self
            .registry
            .active(base, quote)
            .map_err(|_| HostError::PoolNotFound)?;
        Ok((pool_id, base, quote))
    }

    fn escrow_deposit(
        &self,
        user: Address,
        token0: Address,
        token1: Address,
        amount0: U256,
        amount1: U256
    ) -> Result<(), HostError> {
        let vault = relay_vault();
        self.bank
            .transfer(token0, user, vault, amount0)
            .map_err(|err| host_error(err.into()))?;
        self.bank
            .transfer(token1, user, vault, amount1)
            .map_err(|err| {
                // keep the two-token move atomic.
                let _ = self.bank.transfer(token0, vault, user, amount0);
                host_error(err.into())
            })
    }

    fn release_escrow(
        &self,
        to: Address,
        token0: Address,
        token1: Address,
        amount0: U256,
        amount1: U256
    ) -> Result<(), HostError> {
        let vault = relay_vault();
        self.bank
            .transfer(token0, vault, to, amount0)
            .map_err(|err| host_error(err.into()))?;
        self.bank
            .transfer(token1, vault, to, amount1)
            .map_err(|err| host_error(err.into()))
    }

    fn charge_message_fee(&self, payer: Address, amount: U256) -> Result<(), HostError> {
        self.bank
            .debit(NATIVE, payer, amount)
            .map_err(|err| host_error(err.into()))
    }

    fn refund_message_fee(&self, payer: Address, amount: U256) -> Result<(), HostError> {
        self.bank
            .credit(NATIVE, payer, amount)
            .map_err(|err| host_error(err.into()))
    }

    fn apply_remote_add(
        &self,
        src_chain: ChainId,
        envelope: LiquidityEnvelope
    ) -> Result<RemoteAddOutcome, HostError> {
        let (pool_id, meta) = self.remote_meta(envelope.baseToken, envelope.quoteToken)?;
        let _claim = self
            .guard
            .claim(pool_id)
            .ok_or_else(|| HostError::Rejected("pool is busy with another entry".into()))?;

        // The source escrow backs these credits; whatever the deposit does
        // not use stays spendable by the user on this chain.
        self.bank
            .credit(envelope.baseToken, envelope.user, envelope.amount0)
            .map_err(|err| host_error(err.into()))?;
        self.bank
            .credit(envelope.quoteToken, envelope.user, envelope.amount1)
            .map_err(|err| host_error(err.into()))?;

        let applied = self.add_liquidity_inner(
            pool_id,
            &meta,
            envelope.user,
            envelope.amount0,
            envelope.amount1,
            envelope.lowerTick,
            envelope.upperTick
        );

        match applied {
            Ok((slot, priced)) => {
                tracing::info!(pool = %pool_id, src_chain, slot, "remote add settled");
                Ok(RemoteAddOutcome {
                    pool:       pool_id,
                    liquidity:  priced.liquidity,
                    amount0:    priced.amount0,
                    amount1:    priced.amount1,
                    range_slot: slot
                })
            }
            Err(err) => {
                // unwind the bridged credits; the deposit never happened here.
                let _ = self
                    .bank
                    .debit(envelope.baseToken, envelope.user, envelope.amount0);
                let _ = self
                    .bank
                    .debit(envelope.quoteToken, envelope.user, envelope.amount1);
                Err(host_error(err))
            }
        }
    }

    fn apply_remote_remove(
        &self,
        src_chain: ChainId,
        envelope: LiquidityEnvelope
    ) -> Result<RemoteRemoveOutcome, HostError> {
        let (pool_id, meta) = self.remote_meta(envelope.baseToken, envelope.quoteToken)?;
        let _claim = self
            .guard
            .claim(pool_id)
            .ok_or_else(|| HostError::Rejected("pool is busy with another entry".into()))?;

        // Settlement stays on this chain: LP burns here, proceeds land in
        // the user's bank balance here. Nothing is bridged back.
        let priced = self
            .remove_liquidity_inner(pool_id, &meta, envelope.user, envelope.liquidity, envelope.rangeSlot)
            .map_err(host_error)?;

        tracing::info!(pool = %pool_id, src_chain, slot = envelope.rangeSlot, "remote remove settled");
        Ok(RemoteRemoveOutcome {
            pool:      pool_id,
            liquidity: envelope.liquidity,
            amount0:   priced.amount0,
            amount1:   priced.amount1
        })
    }
}
