use std::{
    pin::Pin,
    sync::Arc,
    task::{Context, Poll}
};

use alloy_primitives::{Address, B256, Bytes, U256};
use causeway_common::{ChainId, EventJournal, ExchangeEvent};
use futures::Future;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::{
    chains::ChainRegistry,
    codec::LiquidityEnvelope,
    dedup::ReplayGuard,
    escrow::{EscrowBook, EscrowError, EscrowRecord},
    host::{HostError, LiquidityHost},
    transport::{InboundMessage, Transport}
};

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("caller is not the relay operator")]
    Unauthorized,
    #[error("batch arrays disagree on length")]
    LengthMismatch,
    #[error("batch is empty")]
    EmptyBatch,
    #[error("chain {0} has no registered sibling")]
    UnsupportedChain(ChainId),
    #[error("request moves no value")]
    ZeroAmount,
    #[error("sibling address cannot be zero")]
    InvalidRemote,
    #[error(transparent)]
    Host(#[from] HostError),
    #[error("transport refused the message: {0}")]
    Transport(eyre::Report),
    #[error(transparent)]
    Escrow(#[from] EscrowError)
}

/// How one delivered message was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundDisposition {
    Applied,
    Failed,
    Duplicate
}

/// Moves liquidity between this deployment and registered siblings.
///
/// Outbound adds lock deposits in escrow before the wire is touched, so a
/// message the destination cannot settle always leaves operator-recoverable
/// funds behind. Inbound traffic is deduplicated and origin-checked before
/// the host sees it; a request the local book refuses turns into a failure
/// event rather than an error, the source operator pairs those with their
/// escrows.
pub struct LiquidityRelay<T, H> {
    chain_id:  ChainId,
    operator:  Address,
    transport: T,
    host:      H,
    chains:    ChainRegistry,
    escrows:   EscrowBook,
    replays:   ReplayGuard,
    journal:   Arc<EventJournal>
}

impl<T: Transport, H: LiquidityHost> LiquidityRelay<T, H> {
    pub fn new(
        chain_id: ChainId,
        operator: Address,
        transport: T,
        host: H,
        journal: Arc<EventJournal>
    ) -> Self {
        Self {
            chain_id,
            operator,
            transport,
            host,
            chains: ChainRegistry::new(),
            escrows: EscrowBook::new(),
            replays: ReplayGuard::new(),
            journal
        }
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn chains(&self) -> &ChainRegistry {
        &self.chains
    }

    pub fn escrows(&self) -> &EscrowBook {
        &self.escrows
    }

    pub fn journal(&self) -> &EventJournal {
        &self.journal
    }

    /// Escrows deposits locally and asks each destination to open the
    /// matching range. Nothing is custodied until the whole batch has passed
    /// validation; a transport refusal mid-batch unwinds the unsent tail and
    /// leaves already dispatched messages in flight.
    #[allow(clippy::too_many_arguments)]
    pub fn add_cross_chain_liquidity(
        &self,
        user: Address,
        base: Address,
        quote: Address,
        dst_chains: &[ChainId],
        amounts0: &[U256],
        amounts1: &[U256],
        lower_ticks: &[i32],
        upper_ticks: &[i32],
        adapter_params: &[Bytes]
    ) -> Result<Vec<B256>, RelayError> {
        let batch = dst_chains.len();
        if batch == 0 {
            return Err(RelayError::EmptyBatch);
        }
        let lengths = [
            amounts0.len(),
            amounts1.len(),
            lower_ticks.len(),
            upper_ticks.len(),
            adapter_params.len()
        ];
        if lengths.iter().any(|&len| len != batch) {
            return Err(RelayError::LengthMismatch);
        }

        let (pool, token0, token1) = self.host.pool_tokens(base, quote)?;

        for i in 0..batch {
            if !self.chains.is_supported(dst_chains[i]) {
                return Err(RelayError::UnsupportedChain(dst_chains[i]));
            }
            if amounts0[i].is_zero() && amounts1[i].is_zero() {
                return Err(RelayError::ZeroAmount);
            }
        }

        let payloads = (0..batch)
            .map(|i| {
                LiquidityEnvelope {
                    user,
                    baseToken: base,
                    quoteToken: quote,
                    amount0: amounts0[i],
                    amount1: amounts1[i],
                    lowerTick: lower_ticks[i],
                    upperTick: upper_ticks[i],
                    liquidity: 0,
                    rangeSlot: 0,
                    sourceChainId: self.chain_id,
                    isAdd: true
                }
                .encode()
            })
            .collect::<Vec<_>>();
        let fees = self.quote_batch(dst_chains, &payloads, adapter_params)?;
        let total_fee = batch_fee(&fees);

        self.host.charge_message_fee(user, total_fee)?;

        // Custody each deposit. A refusal puts everything taken so far back.
        for i in 0..batch {
            if let Err(err) =
                self.host
                    .escrow_deposit(user, token0, token1, amounts0[i], amounts1[i])
            {
                for j in 0..i {
                    self.refund_deposit(user, token0, token1, amounts0[j], amounts1[j]);
                }
                self.refund_fee(user, total_fee);
                return Err(err.into());
            }
        }

        let escrow_ids = (0..batch)
            .map(|i| {
                self.escrows.lock(EscrowRecord {
                    user,
                    dst_chain: dst_chains[i],
                    token0,
                    token1,
                    amount0: amounts0[i],
                    amount1: amounts1[i],
                    guid: None
                })
            })
            .collect::<Vec<_>>();

        let mut guids = Vec::with_capacity(batch);
        for i in 0..batch {
            let sent = self.transport.send(
                dst_chains[i],
                payloads[i].clone(),
                &adapter_params[i],
                fees[i],
                user
            );
            let guid = match sent {
                Ok(guid) => guid,
                Err(err) => {
                    // Messages already on the wire keep their escrows until
                    // the destination settles or the operator reclaims.
                    for j in i..batch {
                        if self.escrows.release(escrow_ids[j]).is_ok() {
                            self.refund_deposit(user, token0, token1, amounts0[j], amounts1[j]);
                        }
                    }
                    self.refund_fee(user, batch_fee(&fees[i..]));
                    tracing::warn!(
                        "cross chain add stopped at the transport: {} sent, {} unwound",
                        i,
                        batch - i
                    );
                    return Err(RelayError::Transport(err));
                }
            };

            self.escrows.bind_message(escrow_ids[i], guid)?;
            self.journal
                .record(ExchangeEvent::CrossChainLiquidityRequested {
                    pool,
                    user,
                    dst_chain: dst_chains[i],
                    guid,
                    is_add: true,
                    amount0: amounts0[i],
                    amount1: amounts1[i],
                    lower_tick: lower_ticks[i],
                    upper_tick: upper_ticks[i],
                    liquidity: 0,
                    range_slot: 0,
                    escrow_id: Some(escrow_ids[i])
                });
            guids.push(guid);
        }

        Ok(guids)
    }

    /// Asks each destination to burn a previously opened range there and
    /// credit the proceeds to the user on that chain. Nothing is escrowed
    /// locally, the staked value lives on the destination book.
    pub fn remove_cross_chain_liquidity(
        &self,
        user: Address,
        base: Address,
        quote: Address,
        dst_chains: &[ChainId],
        liquidities: &[u128],
        range_slots: &[u64],
        adapter_params: &[Bytes]
    ) -> Result<Vec<B256>, RelayError> {
        let batch = dst_chains.len();
        if batch == 0 {
            return Err(RelayError::EmptyBatch);
        }
        let lengths = [liquidities.len(), range_slots.len(), adapter_params.len()];
        if lengths.iter().any(|&len| len != batch) {
            return Err(RelayError::LengthMismatch);
        }

        let (pool, _, _) = self.host.pool_tokens(base, quote)?;

        for i in 0..batch {
            if !self.chains.is_supported(dst_chains[i]) {
                return Err(RelayError::UnsupportedChain(dst_chains[i]));
            }
            if liquidities[i] == 0 {
                return Err(RelayError::ZeroAmount);
            }
        }

        let payloads = (0..batch)
            .map(|i| {
                LiquidityEnvelope {
                    user,
                    baseToken: base,
                    quoteToken: quote,
                    amount0: U256::ZERO,
                    amount1: U256::ZERO,
                    lowerTick: 0,
                    upperTick: 0,
                    liquidity: liquidities[i],
                    rangeSlot: range_slots[i],
                    sourceChainId: self.chain_id,
                    isAdd: false
                }
                .encode()
            })
            .collect::<Vec<_>>();
        let fees = self.quote_batch(dst_chains, &payloads, adapter_params)?;

        self.host.charge_message_fee(user, batch_fee(&fees))?;

        let mut guids = Vec::with_capacity(batch);
        for i in 0..batch {
            let sent = self.transport.send(
                dst_chains[i],
                payloads[i].clone(),
                &adapter_params[i],
                fees[i],
                user
            );
            let guid = match sent {
                Ok(guid) => guid,
                Err(err) => {
                    self.refund_fee(user, batch_fee(&fees[i..]));
                    return Err(RelayError::Transport(err));
                }
            };

            self.journal
                .record(ExchangeEvent::CrossChainLiquidityRequested {
                    pool,
                    user,
                    dst_chain: dst_chains[i],
                    guid,
                    is_add: false,
                    amount0: U256::ZERO,
                    amount1: U256::ZERO,
                    lower_tick: 0,
                    upper_tick: 0,
                    liquidity: liquidities[i],
                    range_slot: range_slots[i],
                    escrow_id: None
                });
            guids.push(guid);
        }

        Ok(guids)
    }

    /// Settles one delivered message. Never an error: a request the local
    /// book cannot honor becomes a failure event, which is what the source
    /// operator pairs with the stranded escrow.
    pub fn on_message(&self, message: InboundMessage) -> InboundDisposition {
        let key = ReplayGuard::key(&message.origin, message.guid);
        if !self.replays.mark_handled(key) {
            tracing::debug!("dropping replayed message {:?}", message.guid);
            return InboundDisposition::Duplicate;
        }

        if !self.chains.verify_origin(&message.origin) {
            self.fail(
                message.origin.chain,
                message.guid,
                format!("unknown sender {:?}", message.origin.sender)
            );
            return InboundDisposition::Failed;
        }

        let envelope = match LiquidityEnvelope::decode(&message.payload) {
            Ok(envelope) => envelope,
            Err(err) => {
                self.fail(message.origin.chain, message.guid, format!("malformed payload: {err}"));
                return InboundDisposition::Failed;
            }
        };

        // The envelope's own chain id is advisory. Only the transport-verified
        // origin is trusted.
        let src_chain = message.origin.chain;
        let user = envelope.user;
        let settled = if envelope.isAdd {
            self.host
                .apply_remote_add(src_chain, envelope)
                .map(|outcome| ExchangeEvent::CrossChainLiquidityCompleted {
                    pool:      outcome.pool,
                    user,
                    src_chain,
                    guid:      message.guid,
                    is_add:    true,
                    amount0:   outcome.amount0,
                    amount1:   outcome.amount1,
                    liquidity: outcome.liquidity
                })
        } else {
            self.host
                .apply_remote_remove(src_chain, envelope)
                .map(|outcome| ExchangeEvent::CrossChainLiquidityCompleted {
                    pool:      outcome.pool,
                    user,
                    src_chain,
                    guid:      message.guid,
                    is_add:    false,
                    amount0:   outcome.amount0,
                    amount1:   outcome.amount1,
                    liquidity: outcome.liquidity
                })
        };

        match settled {
            Ok(event) => {
                self.journal.record(event);
                InboundDisposition::Applied
            }
            Err(err) => {
                self.fail(src_chain, message.guid, err.to_string());
                InboundDisposition::Failed
            }
        }
    }

    /// Opens a destination for outbound traffic and pins the sibling relay
    /// address its inbound traffic must carry.
    pub fn register_chain(
        &self,
        caller: Address,
        chain: ChainId,
        remote: Address
    ) -> Result<(), RelayError> {
        self.ensure_operator(caller)?;
        if remote == Address::ZERO {
            return Err(RelayError::InvalidRemote);
        }
        self.chains.register(chain, remote);
        tracing::info!("registered sibling {:?} for chain {}", remote, chain);
        Ok(())
    }

    pub fn unregister_chain(&self, caller: Address, chain: ChainId) -> Result<(), RelayError> {
        self.ensure_operator(caller)?;
        if self.chains.unregister(chain) {
            tracing::info!("unregistered chain {}", chain);
        }
        Ok(())
    }

    /// Returns a stranded escrow to its depositor. Pairing a destination
    /// failure with its escrow id is the operator's call; the book only
    /// proves what was locked.
    pub fn reclaim_escrow(
        &self,
        caller: Address,
        escrow_id: B256
    ) -> Result<EscrowRecord, RelayError> {
        self.ensure_operator(caller)?;
        let record = self.escrows.release(escrow_id)?;
        let refunded = self.host.release_escrow(
            record.user,
            record.token0,
            record.token1,
            record.amount0,
            record.amount1
        );
        if let Err(err) = refunded {
            self.escrows.restore(escrow_id, record);
            return Err(err.into());
        }
        tracing::info!("escrow {:?} reclaimed to {:?}", escrow_id, record.user);
        Ok(record)
    }

    fn quote_batch(
        &self,
        dst_chains: &[ChainId],
        payloads: &[Bytes],
        adapter_params: &[Bytes]
    ) -> Result<Vec<U256>, RelayError> {
        dst_chains
            .iter()
            .zip(payloads)
            .zip(adapter_params)
            .map(|((&dst, payload), params)| {
                self.transport
                    .quote(dst, payload, params)
                    .map_err(RelayError::Transport)
            })
            .collect()
    }

    fn refund_deposit(
        &self,
        user: Address,
        token0: Address,
        token1: Address,
        amount0: U256,
        amount1: U256
    ) {
        if let Err(err) = self
            .host
            .release_escrow(user, token0, token1, amount0, amount1)
        {
            tracing::error!("escrow refund to {:?} failed during unwind: {}", user, err);
        }
    }

    fn refund_fee(&self, user: Address, amount: U256) {
        if amount.is_zero() {
            return;
        }
        if let Err(err) = self.host.refund_message_fee(user, amount) {
            tracing::error!("fee refund to {:?} failed during unwind: {}", user, err);
        }
    }

    fn fail(&self, src_chain: ChainId, guid: B256, reason: String) {
        tracing::warn!("inbound message {:?} from chain {} failed: {}", guid, src_chain, reason);
        self.journal
            .record(ExchangeEvent::CrossChainLiquidityFailed { src_chain, guid, reason });
    }

    fn ensure_operator(&self, caller: Address) -> Result<(), RelayError> {
        if caller != self.operator {
            return Err(RelayError::Unauthorized);
        }
        Ok(())
    }
}

fn batch_fee(fees: &[U256]) -> U256 {
    fees.iter()
        .fold(U256::ZERO, |acc, fee| acc.saturating_add(*fee))
}

/// Drives inbound settlement off the transport's delivery channel. Resolves
/// once the transport drops its side of the wire.
pub struct RelayService<T, H> {
    relay: Arc<LiquidityRelay<T, H>>,
    inbox: mpsc::UnboundedReceiver<InboundMessage>
}

impl<T: Transport, H: LiquidityHost> RelayService<T, H> {
    pub fn new(
        relay: Arc<LiquidityRelay<T, H>>,
        inbox: mpsc::UnboundedReceiver<InboundMessage>
    ) -> Self {
        Self { relay, inbox }
    }
}

impl<T, H> Future for RelayService<T, H>
where
    T: Transport,
    H: LiquidityHost
{
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        while let Poll::Ready(message) = this.inbox.poll_recv(cx) {
            match message {
                Some(message) => {
                    this.relay.on_message(message);
                }
                None => return Poll::Ready(())
            }
        }

        Poll::Pending
    }
}

#[cfg(test)]
mod tests {
    use causeway_common::PoolId;

    use super::*;
    use crate::{
        host::{MockLiquidityHost, RemoteAddOutcome, RemoteRemoveOutcome},
        transport::{LoopbackNetwork, LoopbackTransport, MessageOrigin}
    };

    const LOCAL_CHAIN: ChainId = 1;
    const REMOTE_CHAIN: ChainId = 2;
    const THIRD_CHAIN: ChainId = 3;

    fn operator() -> Address {
        Address::repeat_byte(0x0f)
    }

    fn user() -> Address {
        Address::repeat_byte(0x01)
    }

    fn sibling(chain: ChainId) -> Address {
        Address::repeat_byte(chain as u8)
    }

    fn pool() -> PoolId {
        PoolId::repeat_byte(0x50)
    }

    fn tokens() -> (Address, Address) {
        (Address::repeat_byte(0xa0), Address::repeat_byte(0xa1))
    }

    fn host_with_pool() -> MockLiquidityHost {
        let mut host = MockLiquidityHost::new();
        let (token0, token1) = tokens();
        host.expect_pool_tokens()
            .returning(move |_, _| Ok((pool(), token0, token1)));
        host
    }

    fn relay_on(
        network: &Arc<LoopbackNetwork>,
        host: MockLiquidityHost
    ) -> LiquidityRelay<LoopbackTransport, MockLiquidityHost> {
        LiquidityRelay::new(
            LOCAL_CHAIN,
            operator(),
            network.endpoint(LOCAL_CHAIN, sibling(LOCAL_CHAIN)),
            host,
            Arc::new(EventJournal::default())
        )
    }

    fn add_envelope() -> LiquidityEnvelope {
        let (token0, token1) = tokens();
        LiquidityEnvelope {
            user:          user(),
            baseToken:     token0,
            quoteToken:    token1,
            amount0:       U256::from(1_000u64),
            amount1:       U256::from(500u64),
            lowerTick:     -60,
            upperTick:     60,
            liquidity:     0,
            rangeSlot:     0,
            // deliberately wrong, settlement must use the verified origin
            sourceChainId: 9_999,
            isAdd:         true
        }
    }

    fn inbound(guid_byte: u8, sender: Address, payload: Bytes) -> InboundMessage {
        InboundMessage {
            origin: MessageOrigin { chain: REMOTE_CHAIN, sender },
            guid: B256::repeat_byte(guid_byte),
            payload
        }
    }

    #[test]
    fn add_batch_escrows_charges_and_dispatches() {
        let network = Arc::new(LoopbackNetwork::new());
        let mut remote_inbox = network.connect(REMOTE_CHAIN, U256::from(5u8));

        let mut host = host_with_pool();
        host.expect_charge_message_fee()
            .withf(|payer, amount| *payer == user() && *amount == U256::from(5u8))
            .times(1)
            .returning(|_, _| Ok(()));
        host.expect_escrow_deposit()
            .times(1)
            .returning(|_, _, _, _, _| Ok(()));

        let relay = relay_on(&network, host);
        relay
            .register_chain(operator(), REMOTE_CHAIN, sibling(REMOTE_CHAIN))
            .unwrap();

        let guids = relay
            .add_cross_chain_liquidity(
                user(),
                tokens().0,
                tokens().1,
                &[REMOTE_CHAIN],
                &[U256::from(100u8)],
                &[U256::from(200u8)],
                &[-60],
                &[60],
                &[Bytes::new()]
            )
            .unwrap();
        assert_eq!(guids.len(), 1);

        // escrow locked and bound to the dispatched message
        assert_eq!(relay.escrows().len(), 1);
        let events = relay.journal().events();
        assert_eq!(events.len(), 1);
        let ExchangeEvent::CrossChainLiquidityRequested { guid, is_add, escrow_id, .. } =
            &events[0]
        else {
            panic!("expected a request event, got {:?}", events[0]);
        };
        assert_eq!(*guid, guids[0]);
        assert!(*is_add);
        let record = relay.escrows().get(escrow_id.unwrap()).unwrap();
        assert_eq!(record.guid, Some(guids[0]));

        let delivered = remote_inbox.try_recv().unwrap();
        let envelope = LiquidityEnvelope::decode(&delivered.payload).unwrap();
        assert!(envelope.isAdd);
        assert_eq!(envelope.sourceChainId, LOCAL_CHAIN);
        assert_eq!(envelope.amount0, U256::from(100u8));
    }

    #[test]
    fn unsupported_destination_stops_before_any_custody() {
        let network = Arc::new(LoopbackNetwork::new());
        let _inbox = network.connect(REMOTE_CHAIN, U256::from(5u8));

        // no charge or escrow expectations: any custody call panics the mock
        let relay = relay_on(&network, host_with_pool());
        relay
            .register_chain(operator(), REMOTE_CHAIN, sibling(REMOTE_CHAIN))
            .unwrap();

        let err = relay
            .add_cross_chain_liquidity(
                user(),
                tokens().0,
                tokens().1,
                &[REMOTE_CHAIN, THIRD_CHAIN],
                &[U256::from(1u8); 2],
                &[U256::from(1u8); 2],
                &[-60; 2],
                &[60; 2],
                &[Bytes::new(), Bytes::new()]
            )
            .unwrap_err();
        assert!(matches!(err, RelayError::UnsupportedChain(THIRD_CHAIN)));
        assert!(relay.escrows().is_empty());
        assert!(relay.journal().is_empty());
    }

    #[test]
    fn shape_and_zero_checks_guard_the_batch() {
        let network = Arc::new(LoopbackNetwork::new());
        let _inbox = network.connect(REMOTE_CHAIN, U256::from(5u8));

        let relay = relay_on(&network, host_with_pool());
        relay
            .register_chain(operator(), REMOTE_CHAIN, sibling(REMOTE_CHAIN))
            .unwrap();

        let err = relay
            .add_cross_chain_liquidity(
                user(),
                tokens().0,
                tokens().1,
                &[],
                &[],
                &[],
                &[],
                &[],
                &[]
            )
            .unwrap_err();
        assert!(matches!(err, RelayError::EmptyBatch));

        let err = relay
            .add_cross_chain_liquidity(
                user(),
                tokens().0,
                tokens().1,
                &[REMOTE_CHAIN],
                &[U256::from(1u8); 2],
                &[U256::from(1u8)],
                &[-60],
                &[60],
                &[Bytes::new()]
            )
            .unwrap_err();
        assert!(matches!(err, RelayError::LengthMismatch));

        let err = relay
            .add_cross_chain_liquidity(
                user(),
                tokens().0,
                tokens().1,
                &[REMOTE_CHAIN],
                &[U256::ZERO],
                &[U256::ZERO],
                &[-60],
                &[60],
                &[Bytes::new()]
            )
            .unwrap_err();
        assert!(matches!(err, RelayError::ZeroAmount));
    }

    #[test]
    fn escrow_refusal_unwinds_the_whole_batch() {
        let network = Arc::new(LoopbackNetwork::new());
        let _a = network.connect(REMOTE_CHAIN, U256::from(5u8));
        let _b = network.connect(THIRD_CHAIN, U256::from(7u8));

        let mut host = host_with_pool();
        host.expect_charge_message_fee()
            .withf(|_, amount| *amount == U256::from(12u8))
            .times(1)
            .returning(|_, _| Ok(()));
        host.expect_escrow_deposit()
            .times(2)
            .returning(|_, token0, _, amount0, _| {
                if amount0 == U256::from(300u16) {
                    return Err(HostError::InsufficientBalance {
                        token: token0,
                        need:  amount0,
                        have:  U256::ZERO
                    });
                }
                Ok(())
            });
        host.expect_release_escrow()
            .withf(|to, _, _, amount0, _| *to == user() && *amount0 == U256::from(100u8))
            .times(1)
            .returning(|_, _, _, _, _| Ok(()));
        host.expect_refund_message_fee()
            .withf(|_, amount| *amount == U256::from(12u8))
            .times(1)
            .returning(|_, _| Ok(()));

        let relay = relay_on(&network, host);
        relay
            .register_chain(operator(), REMOTE_CHAIN, sibling(REMOTE_CHAIN))
            .unwrap();
        relay
            .register_chain(operator(), THIRD_CHAIN, sibling(THIRD_CHAIN))
            .unwrap();

        let err = relay
            .add_cross_chain_liquidity(
                user(),
                tokens().0,
                tokens().1,
                &[REMOTE_CHAIN, THIRD_CHAIN],
                &[U256::from(100u8), U256::from(300u16)],
                &[U256::from(200u8), U256::from(400u16)],
                &[-60; 2],
                &[60; 2],
                &[Bytes::new(), Bytes::new()]
            )
            .unwrap_err();
        assert!(matches!(err, RelayError::Host(HostError::InsufficientBalance { .. })));
        assert!(relay.escrows().is_empty());
        assert!(relay.journal().is_empty());
    }

    #[test]
    fn transport_refusal_keeps_sent_escrows_and_refunds_the_rest() {
        let network = Arc::new(LoopbackNetwork::new());
        let mut remote_inbox = network.connect(REMOTE_CHAIN, U256::from(5u8));
        // connected for quoting, then taken offline so the send fails
        let third_inbox = network.connect(THIRD_CHAIN, U256::from(7u8));
        drop(third_inbox);

        let mut host = host_with_pool();
        host.expect_charge_message_fee()
            .withf(|_, amount| *amount == U256::from(12u8))
            .times(1)
            .returning(|_, _| Ok(()));
        host.expect_escrow_deposit()
            .times(2)
            .returning(|_, _, _, _, _| Ok(()));
        host.expect_release_escrow()
            .withf(|to, _, _, amount0, _| *to == user() && *amount0 == U256::from(300u16))
            .times(1)
            .returning(|_, _, _, _, _| Ok(()));
        host.expect_refund_message_fee()
            .withf(|_, amount| *amount == U256::from(7u8))
            .times(1)
            .returning(|_, _| Ok(()));

        let relay = relay_on(&network, host);
        relay
            .register_chain(operator(), REMOTE_CHAIN, sibling(REMOTE_CHAIN))
            .unwrap();
        relay
            .register_chain(operator(), THIRD_CHAIN, sibling(THIRD_CHAIN))
            .unwrap();

        let err = relay
            .add_cross_chain_liquidity(
                user(),
                tokens().0,
                tokens().1,
                &[REMOTE_CHAIN, THIRD_CHAIN],
                &[U256::from(100u8), U256::from(300u16)],
                &[U256::from(200u8), U256::from(400u16)],
                &[-60; 2],
                &[60; 2],
                &[Bytes::new(), Bytes::new()]
            )
            .unwrap_err();
        assert!(matches!(err, RelayError::Transport(_)));

        // first message is in flight with its escrow still locked
        assert_eq!(relay.escrows().len(), 1);
        assert!(remote_inbox.try_recv().is_ok());
        let events = relay.journal().events();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], ExchangeEvent::CrossChainLiquidityRequested { .. }));
    }

    #[test]
    fn remove_requests_need_no_escrow() {
        let network = Arc::new(LoopbackNetwork::new());
        let mut remote_inbox = network.connect(REMOTE_CHAIN, U256::from(5u8));

        let mut host = host_with_pool();
        host.expect_charge_message_fee()
            .times(1)
            .returning(|_, _| Ok(()));

        let relay = relay_on(&network, host);
        relay
            .register_chain(operator(), REMOTE_CHAIN, sibling(REMOTE_CHAIN))
            .unwrap();

        let guids = relay
            .remove_cross_chain_liquidity(
                user(),
                tokens().0,
                tokens().1,
                &[REMOTE_CHAIN],
                &[40_000u128],
                &[3],
                &[Bytes::new()]
            )
            .unwrap();
        assert_eq!(guids.len(), 1);
        assert!(relay.escrows().is_empty());

        let events = relay.journal().events();
        let ExchangeEvent::CrossChainLiquidityRequested {
            is_add, liquidity, range_slot, escrow_id, ..
        } = &events[0]
        else {
            panic!("expected a request event, got {:?}", events[0]);
        };
        assert!(!is_add);
        assert_eq!(*liquidity, 40_000);
        assert_eq!(*range_slot, 3);
        assert!(escrow_id.is_none());

        let envelope =
            LiquidityEnvelope::decode(&remote_inbox.try_recv().unwrap().payload).unwrap();
        assert!(!envelope.isAdd);
        assert_eq!(envelope.liquidity, 40_000);
    }

    #[test]
    fn duplicate_delivery_settles_only_once() {
        let network = Arc::new(LoopbackNetwork::new());
        let mut host = host_with_pool();
        host.expect_apply_remote_add()
            .withf(|src, envelope| *src == REMOTE_CHAIN && envelope.isAdd)
            .times(1)
            .returning(|_, envelope| {
                Ok(RemoteAddOutcome {
                    pool:       pool(),
                    liquidity:  5_000,
                    amount0:    envelope.amount0,
                    amount1:    envelope.amount1,
                    range_slot: 1
                })
            });

        let relay = relay_on(&network, host);
        relay
            .register_chain(operator(), REMOTE_CHAIN, sibling(REMOTE_CHAIN))
            .unwrap();

        let message = inbound(0xee, sibling(REMOTE_CHAIN), add_envelope().encode());
        assert_eq!(relay.on_message(message.clone()), InboundDisposition::Applied);
        assert_eq!(relay.on_message(message), InboundDisposition::Duplicate);

        let events = relay.journal().events();
        assert_eq!(events.len(), 1);
        let ExchangeEvent::CrossChainLiquidityCompleted { src_chain, liquidity, .. } = &events[0]
        else {
            panic!("expected a completion event, got {:?}", events[0]);
        };
        assert_eq!(*src_chain, REMOTE_CHAIN);
        assert_eq!(*liquidity, 5_000);
    }

    #[test]
    fn unknown_origins_are_failed_without_touching_the_host() {
        let network = Arc::new(LoopbackNetwork::new());
        let mut host = host_with_pool();
        host.expect_apply_remote_add()
            .times(1)
            .returning(|_, envelope| {
                Ok(RemoteAddOutcome {
                    pool:       pool(),
                    liquidity:  5_000,
                    amount0:    envelope.amount0,
                    amount1:    envelope.amount1,
                    range_slot: 1
                })
            });

        let relay = relay_on(&network, host);
        relay
            .register_chain(operator(), REMOTE_CHAIN, sibling(REMOTE_CHAIN))
            .unwrap();

        let forged = inbound(0xee, Address::repeat_byte(0x66), add_envelope().encode());
        assert_eq!(relay.on_message(forged), InboundDisposition::Failed);

        let events = relay.journal().events();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], ExchangeEvent::CrossChainLiquidityFailed { .. }));

        // the forged delivery must not shadow the real one
        let real = inbound(0xee, sibling(REMOTE_CHAIN), add_envelope().encode());
        assert_eq!(relay.on_message(real), InboundDisposition::Applied);
    }

    #[test]
    fn inbound_removes_settle_against_the_local_book() {
        let network = Arc::new(LoopbackNetwork::new());
        let mut host = host_with_pool();
        host.expect_apply_remote_remove()
            .withf(|src, envelope| {
                *src == REMOTE_CHAIN && !envelope.isAdd && envelope.rangeSlot == 4
            })
            .times(1)
            .returning(|_, envelope| {
                Ok(RemoteRemoveOutcome {
                    pool:      pool(),
                    liquidity: envelope.liquidity,
                    amount0:   U256::from(90u8),
                    amount1:   U256::from(110u8)
                })
            });

        let relay = relay_on(&network, host);
        relay
            .register_chain(operator(), REMOTE_CHAIN, sibling(REMOTE_CHAIN))
            .unwrap();

        let mut envelope = add_envelope();
        envelope.isAdd = false;
        envelope.rangeSlot = 4;
        envelope.liquidity = 40_000;
        let message = inbound(0xbb, sibling(REMOTE_CHAIN), envelope.encode());
        assert_eq!(relay.on_message(message), InboundDisposition::Applied);

        let events = relay.journal().events();
        let ExchangeEvent::CrossChainLiquidityCompleted { is_add, liquidity, amount0, .. } =
            &events[0]
        else {
            panic!("expected a completion event, got {:?}", events[0]);
        };
        assert!(!is_add);
        assert_eq!(*liquidity, 40_000);
        assert_eq!(*amount0, U256::from(90u8));
    }

    #[test]
    fn host_rejections_become_failure_events() {
        let network = Arc::new(LoopbackNetwork::new());
        let mut host = host_with_pool();
        host.expect_apply_remote_remove()
            .times(1)
            .returning(|_, envelope| Err(HostError::RangeNotFound(envelope.rangeSlot)));

        let relay = relay_on(&network, host);
        relay
            .register_chain(operator(), REMOTE_CHAIN, sibling(REMOTE_CHAIN))
            .unwrap();

        let mut envelope = add_envelope();
        envelope.isAdd = false;
        envelope.rangeSlot = 9;
        let message = inbound(0xdd, sibling(REMOTE_CHAIN), envelope.encode());
        assert_eq!(relay.on_message(message), InboundDisposition::Failed);

        let events = relay.journal().events();
        let ExchangeEvent::CrossChainLiquidityFailed { src_chain, reason, .. } = &events[0]
        else {
            panic!("expected a failure event, got {:?}", events[0]);
        };
        assert_eq!(*src_chain, REMOTE_CHAIN);
        assert!(reason.contains("slot 9"));
    }

    #[test]
    fn undecodable_payloads_are_failed() {
        let network = Arc::new(LoopbackNetwork::new());
        let relay = relay_on(&network, host_with_pool());
        relay
            .register_chain(operator(), REMOTE_CHAIN, sibling(REMOTE_CHAIN))
            .unwrap();

        let message = inbound(0xcc, sibling(REMOTE_CHAIN), Bytes::from(vec![0xff; 7]));
        assert_eq!(relay.on_message(message), InboundDisposition::Failed);
        assert!(matches!(
            &relay.journal().events()[0],
            ExchangeEvent::CrossChainLiquidityFailed { .. }
        ));
    }

    #[test]
    fn chain_management_is_operator_gated() {
        let network = Arc::new(LoopbackNetwork::new());
        let relay = relay_on(&network, host_with_pool());

        let err = relay
            .register_chain(user(), REMOTE_CHAIN, sibling(REMOTE_CHAIN))
            .unwrap_err();
        assert!(matches!(err, RelayError::Unauthorized));

        let err = relay
            .register_chain(operator(), REMOTE_CHAIN, Address::ZERO)
            .unwrap_err();
        assert!(matches!(err, RelayError::InvalidRemote));

        relay
            .register_chain(operator(), REMOTE_CHAIN, sibling(REMOTE_CHAIN))
            .unwrap();
        assert!(relay.chains().is_supported(REMOTE_CHAIN));

        let err = relay.unregister_chain(user(), REMOTE_CHAIN).unwrap_err();
        assert!(matches!(err, RelayError::Unauthorized));
        relay.unregister_chain(operator(), REMOTE_CHAIN).unwrap();
        assert!(!relay.chains().is_supported(REMOTE_CHAIN));
    }

    #[test]
    fn reclaim_returns_the_stranded_deposit() {
        let network = Arc::new(LoopbackNetwork::new());
        let (token0, token1) = tokens();

        let mut host = host_with_pool();
        host.expect_release_escrow()
            .withf(move |to, t0, t1, amount0, amount1| {
                *to == user()
                    && *t0 == token0
                    && *t1 == token1
                    && *amount0 == U256::from(100u8)
                    && *amount1 == U256::from(200u8)
            })
            .times(1)
            .returning(|_, _, _, _, _| Ok(()));

        let relay = relay_on(&network, host);
        let escrow_id = relay.escrows().lock(EscrowRecord {
            user:      user(),
            dst_chain: THIRD_CHAIN,
            token0,
            token1,
            amount0:   U256::from(100u8),
            amount1:   U256::from(200u8),
            guid:      Some(B256::repeat_byte(0xaa)),
        });

        let err = relay.reclaim_escrow(user(), escrow_id).unwrap_err();
        assert!(matches!(err, RelayError::Unauthorized));

        let record = relay.reclaim_escrow(operator(), escrow_id).unwrap();
        assert_eq!(record.amount0, U256::from(100u8));
        assert!(relay.escrows().is_empty());

        let err = relay.reclaim_escrow(operator(), escrow_id).unwrap_err();
        assert!(matches!(err, RelayError::Escrow(EscrowError::Missing(_))));
    }

    #[tokio::test]
    async fn service_settles_inbound_until_the_wire_closes() {
        let network = Arc::new(LoopbackNetwork::new());
        let mut host = host_with_pool();
        host.expect_apply_remote_add()
            .times(1)
            .returning(|_, envelope| {
                Ok(RemoteAddOutcome {
                    pool:       pool(),
                    liquidity:  5_000,
                    amount0:    envelope.amount0,
                    amount1:    envelope.amount1,
                    range_slot: 1
                })
            });

        let relay = Arc::new(relay_on(&network, host));
        relay
            .register_chain(operator(), REMOTE_CHAIN, sibling(REMOTE_CHAIN))
            .unwrap();

        let (tx, rx) = mpsc::unbounded_channel();
        let message = inbound(0xee, sibling(REMOTE_CHAIN), add_envelope().encode());
        tx.send(message.clone()).unwrap();
        tx.send(message).unwrap();
        drop(tx);

        RelayService::new(Arc::clone(&relay), rx).await;

        // one settlement, the duplicate dropped silently
        let events = relay.journal().events();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], ExchangeEvent::CrossChainLiquidityCompleted { .. }));
    }
}
