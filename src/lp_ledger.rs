//! Fungible share ledger for one pool. Constructed unbound, bound exactly
//! once to its controlling pool, after which only that pool may mint or
//! burn. Supply is maintained internally so `total_supply` is O(1) and can
//! never drift from the mint/burn history.

use std::sync::{OnceLock, RwLock};

use alloy_primitives::{Address, U256};
use causeway_common::PoolId;
use dashmap::DashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger is already bound to a controller")]
    AlreadyBound,
    #[error("ledger has no controller yet")]
    Unbound,
    #[error("caller is not the controlling pool")]
    NotController,
    #[error("holder {holder} has {have} shares, needs {need}")]
    InsufficientShares { holder: Address, need: U256, have: U256 },
    #[error("share supply overflow")]
    SupplyOverflow
}

#[derive(Default)]
pub struct LpLedger {
    controller: OnceLock<PoolId>,
    balances:   DashMap<Address, U256>,
    supply:     RwLock<U256>
}

impl LpLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set-once. A second bind fails no matter who asks.
    pub fn bind(&self, controller: PoolId) -> Result<(), LedgerError> {
        self.controller
            .set(controller)
            .map_err(|_| LedgerError::AlreadyBound)
    }

    pub fn controller(&self) -> Option<PoolId> {
        self.controller.get().copied()
    }

    fn ensure_controller(&self, caller: PoolId) -> Result<(), LedgerError> {
        match self.controller.get() {
            None => Err(LedgerError::Unbound),
            Some(bound) if *bound != caller => Err(LedgerError::NotController),
            Some(_) => Ok(())
        }
    }

    pub fn mint(&self, caller: PoolId, to: Address, amount: U256) -> Result<(), LedgerError> {
        self.ensure_controller(caller)?;

        let mut supply = self.supply.write().expect("share supply lock poisoned");
        let next = supply
            .checked_add(amount)
            .ok_or(LedgerError::SupplyOverflow)?;

        let mut balance = self.balances.entry(to).or_default();
        // balance <= supply, so this cannot overflow once supply passed.
        *balance += amount;
        *supply = next;
        Ok(())
    }

    pub fn burn(&self, caller: PoolId, from: Address, amount: U256) -> Result<(), LedgerError> {
        self.ensure_controller(caller)?;

        let mut supply = self.supply.write().expect("share supply lock poisoned");
        let mut balance = self
            .balances
            .get_mut(&from)
            .ok_or(LedgerError::InsufficientShares { holder: from, need: amount, have: U256::ZERO })?;

        *balance = balance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientShares { holder: from, need: amount, have: *balance })?;
        *supply -= amount;
        Ok(())
    }

    /// Holder-initiated move, the one unrestricted entry point.
    pub fn transfer(&self, from: Address, to: Address, amount: U256) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Ok(());
        }

        let mut balance = self
            .balances
            .get_mut(&from)
            .ok_or(LedgerError::InsufficientShares { holder: from, need: amount, have: U256::ZERO })?;
        *balance = balance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientShares { holder: from, need: amount, have: *balance })?;
        drop(balance);

        *self.balances.entry(to).or_default() += amount;
        Ok(())
    }

    pub fn balance_of(&self, holder: Address) -> U256 {
        self.balances.get(&holder).map(|b| *b).unwrap_or_default()
    }

    pub fn total_supply(&self) -> U256 {
        *self.supply.read().expect("share supply lock poisoned")
    }
}
