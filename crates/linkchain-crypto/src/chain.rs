use linkchain_types::{Difficulty, Digest};

/// Trait for records that participate in a proof-of-work hash chain.
pub trait Chained {
    /// Position in the chain.
    fn index(&self) -> u64;
    /// Digest of the predecessor (the sentinel for genesis).
    fn previous_hash(&self) -> Digest;
    /// The digest the record carries.
    fn digest(&self) -> Digest;
    /// The digest recomputed from the record's fields.
    fn recompute_digest(&self) -> Digest;
}

/// Hash chain integrity verifier.
///
/// Verifies that a sequence of records forms a valid chain:
/// each record sits at its own index, links to its predecessor's digest,
/// carries the digest of its own fields, and (except genesis, which is not
/// mined) satisfies the difficulty.
pub struct ChainVerifier;

impl ChainVerifier {
    pub fn verify_chain(
        records: &[impl Chained],
        difficulty: Difficulty,
    ) -> Result<(), ChainError> {
        let Some(genesis) = records.first() else {
            return Ok(());
        };

        if !genesis.previous_hash().is_zero() {
            return Err(ChainError::GenesisHasPrevHash);
        }

        for (position, record) in records.iter().enumerate() {
            let position = position as u64;
            if record.index() != position {
                return Err(ChainError::IndexGap {
                    position,
                    found: record.index(),
                });
            }

            if position > 0 {
                let expected_prev = records[position as usize - 1].digest();
                if record.previous_hash() != expected_prev {
                    return Err(ChainError::BrokenLink { index: position });
                }
            }

            if record.recompute_digest() != record.digest() {
                return Err(ChainError::HashMismatch { index: position });
            }

            if position > 0 && !difficulty.is_met_by(&record.digest()) {
                return Err(ChainError::InsufficientWork {
                    index: position,
                    required: difficulty.leading_zeros(),
                    found: record.digest().leading_zero_nibbles(),
                });
            }
        }

        Ok(())
    }
}

/// Errors from chain verification.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("genesis entry does not reference the sentinel previous hash")]
    GenesisHasPrevHash,

    #[error("entry at position {position} claims index {found}")]
    IndexGap { position: u64, found: u64 },

    #[error("broken link at index {index}: previous hash does not match")]
    BrokenLink { index: u64 },

    #[error("hash mismatch at index {index}: computed digest differs from stored")]
    HashMismatch { index: u64 },

    #[error("insufficient work at index {index}: {found} leading zeros, {required} required")]
    InsufficientWork { index: u64, required: u32, found: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::EntryHasher;

    /// Minimal record for chain verification.
    struct TestRecord {
        index: u64,
        prev: Digest,
        payload: String,
        nonce: u64,
        digest: Digest,
    }

    impl TestRecord {
        fn compute(&self) -> Digest {
            EntryHasher::ENTRY.hash_entry(self.index, &self.prev, "t", &self.payload, self.nonce)
        }
    }

    impl Chained for TestRecord {
        fn index(&self) -> u64 {
            self.index
        }
        fn previous_hash(&self) -> Digest {
            self.prev
        }
        fn digest(&self) -> Digest {
            self.digest
        }
        fn recompute_digest(&self) -> Digest {
            self.compute()
        }
    }

    fn build_chain(count: u64, difficulty: Difficulty) -> Vec<TestRecord> {
        let mut chain: Vec<TestRecord> = Vec::new();
        let mut prev = Digest::ZERO;

        for index in 0..count {
            let mut record = TestRecord {
                index,
                prev,
                payload: format!("record-{index}"),
                nonce: 0,
                digest: Digest::ZERO,
            };
            record.digest = record.compute();
            while index > 0 && !difficulty.is_met_by(&record.digest) {
                record.nonce += 1;
                record.digest = record.compute();
            }
            prev = record.digest;
            chain.push(record);
        }

        chain
    }

    fn easy() -> Difficulty {
        Difficulty::new(1).unwrap()
    }

    #[test]
    fn empty_chain_is_valid() {
        let chain: Vec<TestRecord> = vec![];
        assert!(ChainVerifier::verify_chain(&chain, easy()).is_ok());
    }

    #[test]
    fn multi_record_chain() {
        let chain = build_chain(6, easy());
        assert!(ChainVerifier::verify_chain(&chain, easy()).is_ok());
    }

    #[test]
    fn genesis_with_prev_hash_fails() {
        let mut chain = build_chain(1, easy());
        chain[0].prev = Digest::from_hash([1; 32]);
        let err = ChainVerifier::verify_chain(&chain, easy()).unwrap_err();
        assert_eq!(err, ChainError::GenesisHasPrevHash);
    }

    #[test]
    fn index_gap_detected() {
        let mut chain = build_chain(3, easy());
        chain[2].index = 5;
        let err = ChainVerifier::verify_chain(&chain, easy()).unwrap_err();
        assert_eq!(err, ChainError::IndexGap { position: 2, found: 5 });
    }

    #[test]
    fn broken_link_detected() {
        let mut chain = build_chain(3, easy());
        chain[2].prev = Digest::from_hash([99; 32]);
        let err = ChainVerifier::verify_chain(&chain, easy()).unwrap_err();
        assert_eq!(err, ChainError::BrokenLink { index: 2 });
    }

    #[test]
    fn tampered_payload_detected() {
        let mut chain = build_chain(3, easy());
        chain[1].payload = "tampered".into();
        let err = ChainVerifier::verify_chain(&chain, easy()).unwrap_err();
        assert_eq!(err, ChainError::HashMismatch { index: 1 });
    }

    #[test]
    fn unmined_record_detected() {
        let chain = build_chain(3, Difficulty::ZERO);
        let strict = Difficulty::new(64).unwrap();
        let err = ChainVerifier::verify_chain(&chain, strict).unwrap_err();
        assert!(matches!(err, ChainError::InsufficientWork { index: 1, required: 64, .. }));
    }
}
