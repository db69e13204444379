use linkchain_types::Digest;

/// Why `try_append` refused a candidate entry.
///
/// Every rejection is an expected steady-state event under concurrent mining:
/// the candidate is discarded and never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    #[error("stale or future index: expected {expected}, got {found}")]
    StaleOrFutureIndex { expected: u64, found: u64 },

    #[error("fork mismatch at index {index}: tip is {tip:?}, candidate links to {claimed:?}")]
    ForkMismatch {
        index: u64,
        tip: Digest,
        claimed: Digest,
    },

    #[error("insufficient work at index {index}: {found} leading zeros, {required} required")]
    InsufficientWork {
        index: u64,
        required: u32,
        found: u32,
    },

    #[error("digest mismatch at index {index}: carried {claimed:?}, computed {computed:?}")]
    DigestMismatch {
        index: u64,
        claimed: Digest,
        computed: Digest,
    },
}

/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("candidate rejected: {0}")]
    Rejected(#[from] RejectReason),

    #[error("integrity violation at index {index}: {reason}")]
    IntegrityViolation { index: u64, reason: String },
}

impl LedgerError {
    /// The rejection reason, if this is a validation rejection.
    pub fn rejection(&self) -> Option<&RejectReason> {
        match self {
            Self::Rejected(reason) => Some(reason),
            Self::IntegrityViolation { .. } => None,
        }
    }

    pub(crate) fn poisoned(kind: &str) -> Self {
        Self::IntegrityViolation {
            index: 0,
            reason: format!("ledger {kind} lock poisoned"),
        }
    }
}
