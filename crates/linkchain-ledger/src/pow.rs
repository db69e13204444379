//! Proof-of-work nonce search.

use std::time::{Duration, Instant};

use tracing::trace;

use linkchain_types::Difficulty;

use crate::entry::Entry;

/// Nonce increments between two polls of the cancellation predicate.
pub const CANCEL_POLL_INTERVAL: u64 = 1024;

/// Counters from one nonce search.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MiningStats {
    /// Digests computed, including the draft's own.
    pub attempts: u64,
    pub elapsed: Duration,
}

impl MiningStats {
    /// Hashes per second over the search.
    pub fn hash_rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.attempts as f64 / secs
        } else {
            0.0
        }
    }
}

/// Result of a cancellable search.
#[derive(Clone, Debug)]
pub enum MineOutcome {
    Found { entry: Entry, stats: MiningStats },
    Cancelled { stats: MiningStats },
}

/// Increment the nonce until the digest meets `difficulty`.
///
/// Unbounded: terminates almost surely, but not provably.
pub fn mine(draft: Entry, difficulty: Difficulty) -> Entry {
    let (entry, _) = search(draft, difficulty, || false);
    entry
}

/// Like [`mine`], but polls `should_cancel` every [`CANCEL_POLL_INTERVAL`]
/// nonces and gives up as soon as it returns `true`.
pub fn mine_cancellable<F>(draft: Entry, difficulty: Difficulty, should_cancel: F) -> MineOutcome
where
    F: Fn() -> bool,
{
    match search(draft, difficulty, should_cancel) {
        (entry, stats) if difficulty.is_met_by(&entry.digest()) => {
            MineOutcome::Found { entry, stats }
        }
        (_, stats) => MineOutcome::Cancelled { stats },
    }
}

fn search<F>(mut entry: Entry, difficulty: Difficulty, should_cancel: F) -> (Entry, MiningStats)
where
    F: Fn() -> bool,
{
    let started = Instant::now();
    let preimage = entry.preimage();
    let mut nonce = entry.nonce();
    let mut digest = preimage.finish(nonce);
    let mut attempts = 1u64;

    while !difficulty.is_met_by(&digest) {
        if attempts % CANCEL_POLL_INTERVAL == 0 && should_cancel() {
            trace!(index = entry.index(), attempts, "nonce search cancelled");
            break;
        }
        nonce = nonce.wrapping_add(1);
        digest = preimage.finish(nonce);
        attempts += 1;
    }

    entry.set_mined(nonce, digest);
    let stats = MiningStats {
        attempts,
        elapsed: started.elapsed(),
    };
    (entry, stats)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use linkchain_types::Digest;
    use proptest::prelude::*;

    use super::*;

    fn draft() -> Entry {
        Entry::draft_at(1, Entry::genesis().digest(), "2024-01-01T00:00:00Z", "Block from miner 0")
    }

    #[test]
    fn mined_entry_meets_difficulty() {
        let difficulty = Difficulty::new(2).unwrap();
        let entry = mine(draft(), difficulty);
        assert!(entry.digest().to_hex().starts_with("00"));
        assert!(entry.is_consistent());
    }

    #[test]
    fn zero_difficulty_keeps_draft() {
        let original = draft();
        let entry = mine(original.clone(), Difficulty::ZERO);
        assert_eq!(entry, original);
    }

    #[test]
    fn mining_only_changes_nonce_and_digest() {
        let original = draft();
        let entry = mine(original.clone(), Difficulty::new(1).unwrap());
        assert_eq!(entry.index(), original.index());
        assert_eq!(entry.previous_hash(), original.previous_hash());
        assert_eq!(entry.timestamp(), original.timestamp());
        assert_eq!(entry.payload(), original.payload());
    }

    #[test]
    fn cancellation_stops_impossible_search() {
        let polls = Cell::new(0u32);
        let outcome = mine_cancellable(draft(), Difficulty::new(64).unwrap(), || {
            polls.set(polls.get() + 1);
            polls.get() >= 3
        });
        match outcome {
            MineOutcome::Cancelled { stats } => {
                assert_eq!(stats.attempts, 3 * CANCEL_POLL_INTERVAL);
            }
            MineOutcome::Found { .. } => panic!("difficulty 64 should not be met"),
        }
    }

    #[test]
    fn cancellable_search_finds_easy_target() {
        let outcome = mine_cancellable(draft(), Difficulty::new(1).unwrap(), || false);
        match outcome {
            MineOutcome::Found { entry, stats } => {
                assert!(entry.digest().leading_zero_nibbles() >= 1);
                assert_eq!(stats.attempts, entry.nonce() + 1);
            }
            MineOutcome::Cancelled { .. } => panic!("search was never cancelled"),
        }
    }

    #[test]
    fn hash_rate_handles_zero_elapsed() {
        assert_eq!(MiningStats::default().hash_rate(), 0.0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn mined_digest_satisfies_validator(
            difficulty in 0u32..=2,
            payload in ".{0,40}",
            index in 1u64..1000,
        ) {
            let difficulty = Difficulty::new(difficulty).unwrap();
            let entry = mine(Entry::draft_at(index, Digest::ZERO, "t", payload), difficulty);
            prop_assert!(entry.is_consistent());
            prop_assert!(entry.digest().leading_zero_nibbles() >= difficulty.leading_zeros());
        }
    }
}
