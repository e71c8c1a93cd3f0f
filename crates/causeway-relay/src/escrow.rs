use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering}
};

use alloy::sol_types::SolValue;
use alloy_primitives::{Address, B256, U256, keccak256};
use causeway_common::ChainId;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Funds held on the source chain while an outbound add is in flight.
/// `guid` is bound once the transport accepts the message; a record that
/// never gets a guid belongs to a send that failed before dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowRecord {
    pub user:      Address,
    pub dst_chain: ChainId,
    pub token0:    Address,
    pub token1:    Address,
    pub amount0:   U256,
    pub amount1:   U256,
    pub guid:      Option<B256>
}

#[derive(Debug, thiserror::Error)]
pub enum EscrowError {
    #[error("no escrow locked under id {0}")]
    Missing(B256)
}

/// Source-side book of in-flight cross chain deposits. Ids come from a
/// local nonce rather than the transport guid, since records are locked
/// before the transport is asked to send anything.
#[derive(Clone, Default)]
pub struct EscrowBook {
    records: Arc<DashMap<B256, EscrowRecord>>,
    nonce:   Arc<AtomicU64>
}

impl EscrowBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks a record and returns its id. Never fails; the caller has
    /// already custodied the funds the record describes.
    pub fn lock(&self, record: EscrowRecord) -> B256 {
        let nonce = self.nonce.fetch_add(1, Ordering::Relaxed);
        let id = keccak256((record.user, record.dst_chain, nonce).abi_encode());
        self.records.insert(id, record);
        id
    }

    /// Attaches the transport guid to a locked record.
    pub fn bind_message(&self, id: B256, guid: B256) -> Result<(), EscrowError> {
        let mut record = self.records.get_mut(&id).ok_or(EscrowError::Missing(id))?;
        record.guid = Some(guid);
        Ok(())
    }

    /// Removes a record, handing its contents back to the caller.
    pub fn release(&self, id: B256) -> Result<EscrowRecord, EscrowError> {
        self.records
            .remove(&id)
            .map(|(_, record)| record)
            .ok_or(EscrowError::Missing(id))
    }

    /// Puts a record back under its original id after a release that could
    /// not be settled.
    pub fn restore(&self, id: B256, record: EscrowRecord) {
        self.records.insert(id, record);
    }

    pub fn get(&self, id: B256) -> Option<EscrowRecord> {
        self.records.get(&id).map(|r| r.clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
