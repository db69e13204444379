use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use tracing::debug;

use linkchain_types::Difficulty;

use crate::entry::Entry;
use crate::error::{LedgerError, RejectReason};
use crate::traits::{LedgerReader, LedgerWriter, TipRef};

/// The process-wide ledger, held in memory for the process lifetime.
///
/// All mutation goes through [`LedgerWriter::try_append_with`], which reads
/// the tip, appends and runs the commit hook under one write lock. Mining happens outside the lock
/// against a possibly stale [`LedgerReader::tip`]; the append re-validates.
pub struct InMemoryLedger {
    difficulty: Difficulty,
    chain: RwLock<Vec<Entry>>,
    tip_index: AtomicU64,
}

impl InMemoryLedger {
    /// A ledger holding only the genesis entry.
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            chain: RwLock::new(vec![Entry::genesis()]),
            tip_index: AtomicU64::new(0),
        }
    }

    fn validate(&self, tip: TipRef, candidate: &Entry) -> Result<(), RejectReason> {
        let expected = tip.index + 1;
        if candidate.index() != expected {
            return Err(RejectReason::StaleOrFutureIndex {
                expected,
                found: candidate.index(),
            });
        }

        if candidate.previous_hash() != tip.digest {
            return Err(RejectReason::ForkMismatch {
                index: candidate.index(),
                tip: tip.digest,
                claimed: candidate.previous_hash(),
            });
        }

        let computed = candidate.compute_digest();
        if !self.difficulty.is_met_by(&computed) {
            return Err(RejectReason::InsufficientWork {
                index: candidate.index(),
                required: self.difficulty.leading_zeros(),
                found: computed.leading_zero_nibbles(),
            });
        }

        if computed != candidate.digest() {
            return Err(RejectReason::DigestMismatch {
                index: candidate.index(),
                claimed: candidate.digest(),
                computed,
            });
        }

        Ok(())
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new(Difficulty::default())
    }
}

impl LedgerWriter for InMemoryLedger {
    fn try_append_with(
        &self,
        candidate: Entry,
        on_commit: &mut dyn FnMut(&Entry),
    ) -> Result<TipRef, LedgerError> {
        let mut chain = self
            .chain
            .write()
            .map_err(|_| LedgerError::poisoned("write"))?;

        let current = chain.last().map(TipRef::from).ok_or_else(missing_genesis)?;
        self.validate(current, &candidate)?;

        let tip = TipRef::from(&candidate);
        on_commit(&candidate);
        chain.push(candidate);
        self.tip_index.store(tip.index, Ordering::Release);
        debug!(index = tip.index, digest = %tip.digest, "entry committed");

        Ok(tip)
    }
}

impl LedgerReader for InMemoryLedger {
    fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    fn tip(&self) -> Result<TipRef, LedgerError> {
        let chain = self
            .chain
            .read()
            .map_err(|_| LedgerError::poisoned("read"))?;

        chain.last().map(TipRef::from).ok_or_else(missing_genesis)
    }

    fn tip_index(&self) -> u64 {
        self.tip_index.load(Ordering::Acquire)
    }

    fn entry_count(&self) -> Result<u64, LedgerError> {
        let chain = self
            .chain
            .read()
            .map_err(|_| LedgerError::poisoned("read"))?;
        Ok(chain.len() as u64)
    }

    fn get(&self, index: u64) -> Result<Option<Entry>, LedgerError> {
        let chain = self
            .chain
            .read()
            .map_err(|_| LedgerError::poisoned("read"))?;
        Ok(usize::try_from(index)
            .ok()
            .and_then(|i| chain.get(i))
            .cloned())
    }

    fn entries(&self) -> Result<Vec<Entry>, LedgerError> {
        let chain = self
            .chain
            .read()
            .map_err(|_| LedgerError::poisoned("read"))?;
        Ok(chain.clone())
    }
}

fn missing_genesis() -> LedgerError {
    LedgerError::IntegrityViolation {
        index: 0,
        reason: "ledger has no genesis entry".into(),
    }
}
