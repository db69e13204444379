use linkchain_types::Digest;

/// Domain-separated BLAKE3 digest function for ledger entries.
///
/// The preimage is the mechanical concatenation of an entry's fields in fixed
/// order: `index ∥ previous_hash ∥ timestamp ∥ payload ∥ nonce`, integers in
/// decimal and the previous hash in lowercase hex. The domain tag is
/// prepended so entry digests never collide with other uses of BLAKE3.
#[derive(Clone, Copy, Debug)]
pub struct EntryHasher {
    domain: &'static str,
}

impl EntryHasher {
    /// Hasher for ledger entries.
    pub const ENTRY: Self = Self {
        domain: "linkchain-entry-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> Digest {
        let mut hasher = self.seeded();
        hasher.update(data);
        Digest::from_hash(*hasher.finalize().as_bytes())
    }

    /// Digest of an entry's fields.
    pub fn hash_entry(
        &self,
        index: u64,
        previous_hash: &Digest,
        timestamp: &str,
        payload: &str,
        nonce: u64,
    ) -> Digest {
        self.preimage(index, previous_hash, timestamp, payload)
            .finish(nonce)
    }

    /// Absorb every field except the nonce.
    ///
    /// Proof-of-work only varies the nonce, so the miner hashes the fixed
    /// prefix once and clones the state per attempt.
    pub fn preimage(
        &self,
        index: u64,
        previous_hash: &Digest,
        timestamp: &str,
        payload: &str,
    ) -> EntryPreimage {
        let mut state = self.seeded();
        state.update(index.to_string().as_bytes());
        state.update(previous_hash.to_hex().as_bytes());
        state.update(timestamp.as_bytes());
        state.update(payload.as_bytes());
        EntryPreimage { state }
    }

    /// Raw BLAKE3 hash without domain separation (for low-level use).
    pub fn raw_hash(data: &[u8]) -> [u8; 32] {
        *blake3::hash(data).as_bytes()
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }

    fn seeded(&self) -> blake3::Hasher {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher
    }
}

impl Default for EntryHasher {
    fn default() -> Self {
        Self::ENTRY
    }
}

/// Hasher state holding every entry field but the nonce.
#[derive(Clone)]
pub struct EntryPreimage {
    state: blake3::Hasher,
}

impl EntryPreimage {
    /// Complete the digest for one nonce.
    pub fn finish(&self, nonce: u64) -> Digest {
        let mut state = self.state.clone();
        state.update(nonce.to_string().as_bytes());
        Digest::from_hash(*state.finalize().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let data = b"hello world";
        assert_eq!(EntryHasher::ENTRY.hash(data), EntryHasher::ENTRY.hash(data));
    }

    #[test]
    fn custom_domain_changes_output() {
        let hasher = EntryHasher::new("my-custom-domain-v1");
        assert_ne!(hasher.hash(b"data"), EntryHasher::ENTRY.hash(b"data"));
    }

    #[test]
    fn entry_digest_is_concatenation_of_fields() {
        let prev = Digest::from_hash([0xab; 32]);
        let concatenated = format!("7{}2024-01-01T00:00:00Zpayload42", prev.to_hex());
        let expected = EntryHasher::ENTRY.hash(concatenated.as_bytes());
        let actual =
            EntryHasher::ENTRY.hash_entry(7, &prev, "2024-01-01T00:00:00Z", "payload", 42);
        assert_eq!(actual, expected);
    }

    #[test]
    fn preimage_reuse_matches_fresh_hash() {
        let prev = Digest::ZERO;
        let preimage = EntryHasher::ENTRY.preimage(1, &prev, "t", "p");
        for nonce in [0u64, 1, 99, u64::MAX] {
            assert_eq!(
                preimage.finish(nonce),
                EntryHasher::ENTRY.hash_entry(1, &prev, "t", "p", nonce)
            );
        }
    }

    #[test]
    fn nonce_changes_digest() {
        let prev = Digest::ZERO;
        let a = EntryHasher::ENTRY.hash_entry(1, &prev, "t", "p", 0);
        let b = EntryHasher::ENTRY.hash_entry(1, &prev, "t", "p", 1);
        assert_ne!(a, b);
    }

    #[test]
    fn raw_hash_no_domain() {
        let raw = EntryHasher::raw_hash(b"test");
        assert_eq!(raw, *blake3::hash(b"test").as_bytes());
        assert_ne!(raw, *EntryHasher::ENTRY.hash(b"test").as_bytes());
    }
}
