//! Gossip propagation for Linkchain.
//!
//! Committed entries leave through a [`Broadcaster`]; entries mined by peers
//! arrive through a [`GossipListener`], which offers them to the ledger the
//! same way a local miner would. Both sit on a [`FrameTransport`].

pub mod broadcaster;
pub mod error;
pub mod listener;
pub mod loopback;
pub mod raw;
pub mod transport;

pub use broadcaster::{Broadcaster, Outbox};
pub use error::{SyncError, SyncResult};
pub use listener::{
    FrameOutcome, GossipListener, ListenerCounts, ListenerStats, DEFAULT_POLL_INTERVAL,
};
pub use loopback::{LoopbackHub, LoopbackTransport};
pub use raw::{RawSocketTransport, ETHER_TYPE};
pub use transport::FrameTransport;
