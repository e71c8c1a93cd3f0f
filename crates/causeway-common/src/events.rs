use std::sync::atomic::{AtomicU64, Ordering};

use alloy_primitives::{Address, B256, U256};
use causeway_amm::{PoolId, tick_info::Tick};
use dashmap::DashMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::ChainId;

/// Everything the exchange tells the outside world. The log is the contract
/// indexers consume, each entry carries enough to reconstruct the state
/// delta without replaying pool math.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExchangeEvent {
    PoolCreated {
        pool:          PoolId,
        base:          Address,
        quote:         Address,
        name:          String,
        symbol:        String,
        fee_recipient: Address,
        stable_pair:   bool,
        lp_token:      Address
    },
    PoolDeactivated {
        pool:  PoolId,
        base:  Address,
        quote: Address
    },
    LiquidityAdded {
        pool:      PoolId,
        user:      Address,
        amount0:   U256,
        amount1:   U256,
        liquidity: u128
    },
    LiquidityRemoved {
        pool:      PoolId,
        user:      Address,
        amount0:   U256,
        amount1:   U256,
        liquidity: u128
    },
    RangeAdded {
        pool:       PoolId,
        user:       Address,
        slot:       u64,
        lower_tick: Tick,
        upper_tick: Tick,
        liquidity:  u128
    },
    RangeRemoved {
        pool:       PoolId,
        user:       Address,
        slot:       u64,
        lower_tick: Tick,
        upper_tick: Tick,
        liquidity:  u128
    },
    SwapExecuted {
        pool:       PoolId,
        user:       Address,
        token_in:   Address,
        token_out:  Address,
        amount_in:  U256,
        amount_out: U256,
        fee:        U256,
        end_tick:   Tick
    },
    CrossChainLiquidityRequested {
        pool:       PoolId,
        user:       Address,
        dst_chain:  ChainId,
        guid:       B256,
        is_add:     bool,
        amount0:    U256,
        amount1:    U256,
        lower_tick: Tick,
        upper_tick: Tick,
        liquidity:  u128,
        range_slot: u64,
        escrow_id:  Option<B256>
    },
    CrossChainLiquidityCompleted {
        pool:      PoolId,
        user:      Address,
        src_chain: ChainId,
        guid:      B256,
        is_add:    bool,
        amount0:   U256,
        amount1:   U256,
        liquidity: u128
    },
    CrossChainLiquidityFailed {
        src_chain: ChainId,
        guid:      B256,
        reason:    String
    }
}

const DEFAULT_FEED_CAPACITY: usize = 1024;

/// Append-only event log with a live broadcast feed bolted on. Sequence
/// numbers are handed out atomically so concurrent writers never collide.
pub struct EventJournal {
    seq:  AtomicU64,
    log:  DashMap<u64, ExchangeEvent>,
    feed: broadcast::Sender<ExchangeEvent>
}

impl Default for EventJournal {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

impl EventJournal {
    pub fn new(feed_capacity: usize) -> Self {
        let (feed, _) = broadcast::channel(feed_capacity);
        Self { seq: AtomicU64::new(0), log: DashMap::default(), feed }
    }

    /// Appends the event and pushes it to live subscribers, returning its
    /// sequence number.
    pub fn record(&self, event: ExchangeEvent) -> u64 {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(seq, event = ?event, "exchange event");

        self.log.insert(seq, event.clone());
        // nobody listening is fine, the log is the durable record.
        let _ = self.feed.send(event);

        seq
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ExchangeEvent> {
        self.feed.subscribe()
    }

    /// Full log in sequence order.
    pub fn events(&self) -> Vec<ExchangeEvent> {
        self.log
            .iter()
            .sorted_by_key(|entry| *entry.key())
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deactivation(byte: u8) -> ExchangeEvent {
        ExchangeEvent::PoolDeactivated {
            pool:  PoolId::repeat_byte(byte),
            base:  Address::repeat_byte(byte),
            quote: Address::repeat_byte(byte.wrapping_add(1))
        }
    }

    #[test]
    fn log_preserves_record_order() {
        let journal = EventJournal::default();

        for byte in [1u8, 2, 3] {
            journal.record(deactivation(byte));
        }

        let events = journal.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], deactivation(1));
        assert_eq!(events[2], deactivation(3));
    }

    #[test]
    fn subscribers_see_events_as_they_land() {
        let journal = EventJournal::default();
        let mut feed = journal.subscribe();

        journal.record(deactivation(7));
        assert_eq!(feed.try_recv().unwrap(), deactivation(7));
    }

    #[test]
    fn events_survive_serde_for_indexers() {
        let journal = EventJournal::default();
        journal.record(deactivation(9));

        let json = serde_json::to_string(&journal.events()).unwrap();
        let restored: Vec<ExchangeEvent> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, journal.events());
    }
}
