use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use linkchain_crypto::{Chained, EntryHasher};
use linkchain_types::Digest;

/// Payload of the fixed genesis entry.
pub const GENESIS_PAYLOAD: &str = "Genesis Block";

/// Timestamp of the fixed genesis entry. Shared by every peer so that all
/// ledgers start from the same digest.
pub const GENESIS_TIMESTAMP: &str = "1970-01-01T00:00:00Z";

/// One record in the ledger.
///
/// `digest` is derived from the other fields and is kept in sync by every
/// mutator on this type. The one exception is [`Entry::from_claim`], which
/// carries a digest received from a peer verbatim so the ledger can check
/// it; see [`Entry::is_consistent`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Entry {
    index: u64,
    previous_hash: Digest,
    timestamp: String,
    payload: String,
    nonce: u64,
    digest: Digest,
}

impl Entry {
    /// The fixed, unmined first entry of every ledger.
    pub fn genesis() -> Self {
        Self::draft_at(0, Digest::ZERO, GENESIS_TIMESTAMP, GENESIS_PAYLOAD)
    }

    /// A draft stamped with the current UTC time (RFC 3339).
    pub fn draft(index: u64, previous_hash: Digest, payload: impl Into<String>) -> Self {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        Self::draft_at(index, previous_hash, timestamp, payload)
    }

    /// A draft with an explicit timestamp. The nonce starts at zero.
    pub fn draft_at(
        index: u64,
        previous_hash: Digest,
        timestamp: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        let mut entry = Self {
            index,
            previous_hash,
            timestamp: timestamp.into(),
            payload: payload.into(),
            nonce: 0,
            digest: Digest::ZERO,
        };
        entry.digest = entry.compute_digest();
        entry
    }

    /// An entry as claimed by a peer. The carried `digest` is not trusted.
    pub fn from_claim(
        index: u64,
        previous_hash: Digest,
        timestamp: String,
        payload: String,
        nonce: u64,
        digest: Digest,
    ) -> Self {
        Self {
            index,
            previous_hash,
            timestamp,
            payload,
            nonce,
            digest,
        }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn previous_hash(&self) -> Digest {
        self.previous_hash
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn digest(&self) -> Digest {
        self.digest
    }

    /// Set the nonce and recompute the digest.
    pub fn set_nonce(&mut self, nonce: u64) {
        self.nonce = nonce;
        self.digest = self.compute_digest();
    }

    /// Recompute the digest from the current field values.
    pub fn compute_digest(&self) -> Digest {
        EntryHasher::ENTRY.hash_entry(
            self.index,
            &self.previous_hash,
            &self.timestamp,
            &self.payload,
            self.nonce,
        )
    }

    /// Returns `true` if the carried digest matches the fields.
    pub fn is_consistent(&self) -> bool {
        self.compute_digest() == self.digest
    }

    /// Hasher state over every field but the nonce.
    pub(crate) fn preimage(&self) -> linkchain_crypto::EntryPreimage {
        EntryHasher::ENTRY.preimage(
            self.index,
            &self.previous_hash,
            &self.timestamp,
            &self.payload,
        )
    }

    /// Install a nonce whose digest the caller computed from [`Self::preimage`].
    pub(crate) fn set_mined(&mut self, nonce: u64, digest: Digest) {
        self.nonce = nonce;
        self.digest = digest;
    }
}

impl Chained for Entry {
    fn index(&self) -> u64 {
        self.index
    }

    fn previous_hash(&self) -> Digest {
        self.previous_hash
    }

    fn digest(&self) -> Digest {
        self.digest
    }

    fn recompute_digest(&self) -> Digest {
        self.compute_digest()
    }
}
