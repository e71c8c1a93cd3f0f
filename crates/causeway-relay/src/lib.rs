pub mod chains;
pub mod codec;
pub mod dedup;
pub mod escrow;
pub mod host;
pub mod relay;
pub mod transport;

// Re-export commonly used types
pub use chains::ChainRegistry;
pub use codec::{CodecError, LiquidityEnvelope};
pub use dedup::ReplayGuard;
pub use escrow::{EscrowBook, EscrowError, EscrowRecord};
pub use host::{HostError, LiquidityHost, RemoteAddOutcome, RemoteRemoveOutcome};
pub use relay::{InboundDisposition, LiquidityRelay, RelayError, RelayService};
pub use transport::{InboundMessage, LoopbackNetwork, LoopbackTransport, MessageOrigin, Transport};
