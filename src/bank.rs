//! Minimal custody ledger for pair tokens and the native fee asset. This is
//! deliberately not an ERC-20: no approvals, no events of its own, just the
//! balance moves the exchange and relay need to settle against.

use alloy_primitives::{Address, U256};
use dashmap::DashMap;
use thiserror::Error;

/// The native asset, used only to pay transport fees. Pools refuse it as a
/// pair token.
pub const NATIVE: Address = Address::ZERO;

#[derive(Debug, Error)]
pub enum BankError {
    #[error("holder {holder} has {have} of token {token}, needs {need}")]
    InsufficientBalance { token: Address, holder: Address, need: U256, have: U256 },
    #[error("balance overflow for token {token}")]
    BalanceOverflow { token: Address }
}

/// Balances keyed by (token, holder). Zero-amount moves are no-ops so call
/// sites never special-case one-sided deposits.
#[derive(Default)]
pub struct TokenBank {
    balances: DashMap<(Address, Address), U256>
}

impl TokenBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self, token: Address, holder: Address) -> U256 {
        self.balances
            .get(&(token, holder))
            .map(|b| *b)
            .unwrap_or_default()
    }

    pub fn credit(&self, token: Address, holder: Address, amount: U256) -> Result<(), BankError> {
        if amount.is_zero() {
            return Ok(());
        }

        let mut entry = self.balances.entry((token, holder)).or_default();
        *entry = entry
            .checked_add(amount)
            .ok_or(BankError::BalanceOverflow { token })?;
        Ok(())
    }

    pub fn debit(&self, token: Address, holder: Address, amount: U256) -> Result<(), BankError> {
        if amount.is_zero() {
            return Ok(());
        }

        let mut entry = self
            .balances
            .get_mut(&(token, holder))
            .ok_or(BankError::InsufficientBalance {
                token,
                holder,
                need: amount,
                have: U256::ZERO
            })?;

        *entry = entry
            .checked_sub(amount)
            .ok_or(BankError::InsufficientBalance { token, holder, need: amount, have: *entry })?;
        Ok(())
    }

    pub fn transfer(
        &self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256
    ) -> Result<(), BankError> {
        self.debit(token, from, amount)?;
        // credit cannot overflow once the debit succeeded, total value is
        // conserved, but the error is still surfaced rather than swallowed.
        self.credit(token, to, amount)
    }
}
