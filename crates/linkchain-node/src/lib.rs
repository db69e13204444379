//! Linkchain node runtime.
//!
//! Wires one [`InMemoryLedger`](linkchain_ledger::InMemoryLedger) to a
//! [`MinerPool`] and a gossip listener over a shared frame transport.

pub mod config;
pub mod error;
pub mod node;
pub mod pool;

pub use config::{NodeConfig, TransportKind};
pub use error::{NodeError, NodeResult};
pub use node::{open_transport, Node, NodeHandle, NodeReport};
pub use pool::{MinerPool, PoolCounts, PoolStats};
