//! Messaging transport boundary. The relay only ever sees this port, the
//! concrete wire (and its delivery guarantees) is injected from outside.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering}
};

use alloy_primitives::{Address, B256, Bytes, U256, keccak256};
use auto_impl::auto_impl;
use causeway_common::ChainId;
use dashmap::DashMap;
use tokio::sync::mpsc;

/// Verified origin of a delivered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageOrigin {
    pub chain:  ChainId,
    pub sender: Address
}

/// A message as handed to the destination relay by its transport.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub origin:  MessageOrigin,
    pub guid:    B256,
    pub payload: Bytes
}

#[auto_impl(&, Arc, Box)]
pub trait Transport: Send + Sync + 'static {
    /// Native fee required to deliver `payload` to `dst_chain`.
    fn quote(
        &self,
        dst_chain: ChainId,
        payload: &[u8],
        adapter_params: &[u8]
    ) -> eyre::Result<U256>;

    /// Hands the payload to the wire, returning the message guid. `fee` must
    /// cover the quoted cost, any excess is the transport's to refund to
    /// `refund_address`.
    fn send(
        &self,
        dst_chain: ChainId,
        payload: Bytes,
        adapter_params: &[u8],
        fee: U256,
        refund_address: Address
    ) -> eyre::Result<B256>;
}

/// In-process wire connecting any number of chain endpoints. Delivery is a
/// plain unbounded channel per destination, which makes duplicates, drops
/// and reordering trivial to stage in tests.
#[derive(Default)]
pub struct LoopbackNetwork {
    routes: DashMap<ChainId, mpsc::UnboundedSender<InboundMessage>>,
    fees:   DashMap<ChainId, U256>,
    seq:    AtomicU64
}

impl LoopbackNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a chain to the wire with a flat delivery fee, returning the
    /// inbox its relay service drains.
    pub fn connect(&self, chain: ChainId, fee: U256) -> mpsc::UnboundedReceiver<InboundMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.routes.insert(chain, tx);
        self.fees.insert(chain, fee);
        rx
    }

    /// One chain's sending handle onto the wire. `sender` is the address
    /// destinations will see (and verify) as the message originator.
    pub fn endpoint(self: &Arc<Self>, chain: ChainId, sender: Address) -> LoopbackTransport {
        LoopbackTransport { network: Arc::clone(self), local_chain: chain, sender }
    }
}

#[derive(Clone)]
pub struct LoopbackTransport {
    network:     Arc<LoopbackNetwork>,
    local_chain: ChainId,
    sender:      Address
}

impl Transport for LoopbackTransport {
    fn quote(
        &self,
        dst_chain: ChainId,
        _payload: &[u8],
        _adapter_params: &[u8]
    ) -> eyre::Result<U256> {
        self.network
            .fees
            .get(&dst_chain)
            .map(|fee| *fee)
            .ok_or_else(|| eyre::eyre!("no route to chain {dst_chain}"))
    }

    fn send(
        &self,
        dst_chain: ChainId,
        payload: Bytes,
        adapter_params: &[u8],
        fee: U256,
        _refund_address: Address
    ) -> eyre::Result<B256> {
        let quoted = self.quote(dst_chain, &payload, adapter_params)?;
        if fee < quoted {
            eyre::bail!("fee {fee} does not cover quoted {quoted} for chain {dst_chain}");
        }

        let seq = self.network.seq.fetch_add(1, Ordering::SeqCst);
        let mut preimage = Vec::with_capacity(16 + payload.len());
        preimage.extend_from_slice(&dst_chain.to_be_bytes());
        preimage.extend_from_slice(&seq.to_be_bytes());
        preimage.extend_from_slice(&payload);
        let guid = keccak256(preimage);

        let route = self
            .network
            .routes
            .get(&dst_chain)
            .ok_or_else(|| eyre::eyre!("no route to chain {dst_chain}"))?;
        route
            .send(InboundMessage {
                origin: MessageOrigin { chain: self.local_chain, sender: self.sender },
                guid,
                payload
            })
            .map_err(|_| eyre::eyre!("chain {dst_chain} endpoint is offline"))?;

        Ok(guid)
    }
}
