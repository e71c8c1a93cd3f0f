//! Causeway: an automated-market-maker exchange engine with a cross-chain
//! liquidity relay.
//!
//! The workspace splits along the dependency arrow: `causeway-amm` is the
//! pure tick/range/swap structure, `causeway-common` adds pair identity and
//! the shared pool set, `causeway-relay` moves liquidity intents between
//! chains, and this crate wires them into one venue: custody, share
//! ledgers, the pool registry, and the exchange entry points.

pub mod bank;
pub mod config;
pub mod exchange;
pub mod guard;
pub mod lp_ledger;
pub mod registry;

pub use bank::{BankError, NATIVE, TokenBank};
pub use causeway_amm as amm;
pub use causeway_common as common;
pub use causeway_relay as relay;
pub use config::{ConfigError, ExchangeConfig, MAX_FEE_BPS};
pub use exchange::{Exchange, ExchangeError, relay_vault};
pub use guard::EntryGuard;
pub use lp_ledger::{LedgerError, LpLedger};
pub use registry::{PoolMeta, PoolRegistry, RegistryError};
