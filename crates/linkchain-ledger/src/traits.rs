use linkchain_types::{Difficulty, Digest};

use crate::entry::Entry;
use crate::error::LedgerError;

/// Index and digest of the most recently committed entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TipRef {
    pub index: u64,
    pub digest: Digest,
}

impl From<&Entry> for TipRef {
    fn from(entry: &Entry) -> Self {
        Self {
            index: entry.index(),
            digest: entry.digest(),
        }
    }
}

/// Write boundary: the single serialized commit point of the ledger.
pub trait LedgerWriter: Send + Sync {
    /// Validate `candidate` against the current tip and append it atomically.
    fn try_append(&self, candidate: Entry) -> Result<TipRef, LedgerError> {
        self.try_append_with(candidate, &mut |_| {})
    }

    /// Like [`try_append`](Self::try_append), but runs `on_commit` on the
    /// accepted entry before the commit point is released. Callers see
    /// commits in chain order. `on_commit` must not touch the ledger.
    fn try_append_with(
        &self,
        candidate: Entry,
        on_commit: &mut dyn FnMut(&Entry),
    ) -> Result<TipRef, LedgerError>;
}

/// Read boundary for tip inspection and chain queries.
pub trait LedgerReader: Send + Sync {
    fn difficulty(&self) -> Difficulty;

    fn tip(&self) -> Result<TipRef, LedgerError>;

    /// Index of the current tip, readable without taking the ledger lock.
    /// May lag a concurrent commit by an instant.
    fn tip_index(&self) -> u64;

    fn entry_count(&self) -> Result<u64, LedgerError>;

    fn get(&self, index: u64) -> Result<Option<Entry>, LedgerError>;

    fn entries(&self) -> Result<Vec<Entry>, LedgerError>;
}
