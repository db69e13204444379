//! Gossip wire protocol for Linkchain.
//!
//! Defines the frame layout used to broadcast committed entries over the
//! link layer and to parse frames received from peers.

pub mod codec;
pub mod error;
pub mod message;

pub use codec::GossipCodec;
pub use error::{ProtocolError, ProtocolResult};
pub use message::{WireEntry, FRAME_MAGIC, HEADER_LEN, MAX_BODY_SIZE, MAX_FRAME_SIZE, PROTOCOL_VERSION};
