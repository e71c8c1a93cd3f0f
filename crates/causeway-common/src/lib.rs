pub mod events;
pub mod pair;
pub mod pools;
pub mod range_book;

// Re-export commonly used types
pub use causeway_amm::PoolId;
pub use events::{EventJournal, ExchangeEvent};
pub use pair::{PairKey, lp_token_address};
pub use pools::{Pools, PoolsSnapshot};
pub use range_book::RangeBook;

/// Numeric identity of one chain deployment.
pub type ChainId = u64;
