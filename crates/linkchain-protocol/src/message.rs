use serde::{Deserialize, Serialize};

use linkchain_ledger::Entry;
use linkchain_types::Digest;

pub const PROTOCOL_VERSION: u8 = 1;

/// Leading bytes of every gossip frame.
pub const FRAME_MAGIC: [u8; 4] = *b"LKCH";

/// `magic (4) | version (1) | body_len (4)`.
pub const HEADER_LEN: usize = 9;

/// Largest frame that fits in one Ethernet payload.
pub const MAX_FRAME_SIZE: usize = 1500;

pub const MAX_BODY_SIZE: usize = MAX_FRAME_SIZE - HEADER_LEN;

/// An entry as it travels on the wire, fields in gossip order.
///
/// Strings are length-prefixed by the body encoding, so no field value can
/// be confused with a separator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEntry {
    pub index: u64,
    pub previous_hash: Digest,
    pub timestamp: String,
    pub payload: String,
    pub digest: Digest,
    pub nonce: u64,
}

impl From<&Entry> for WireEntry {
    fn from(entry: &Entry) -> Self {
        Self {
            index: entry.index(),
            previous_hash: entry.previous_hash(),
            timestamp: entry.timestamp().to_string(),
            payload: entry.payload().to_string(),
            digest: entry.digest(),
            nonce: entry.nonce(),
        }
    }
}

impl From<WireEntry> for Entry {
    /// The result is a claim: its digest is carried, not recomputed.
    fn from(wire: WireEntry) -> Self {
        Entry::from_claim(
            wire.index,
            wire.previous_hash,
            wire.timestamp,
            wire.payload,
            wire.nonce,
            wire.digest,
        )
    }
}
