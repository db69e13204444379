//! Append-only proof-of-work ledger for Linkchain.
//!
//! This crate is the heart of Linkchain. It provides:
//! - [`Entry`] records with a derived, always-recomputed digest
//! - Nonce search ([`mine`], [`mine_cancellable`]) against a [`Difficulty`]
//! - `LedgerWriter` / `LedgerReader` trait boundaries
//! - [`InMemoryLedger`], whose `try_append` is the single commit point
//! - Whole-chain auditing ([`ChainAudit`])
//!
//! [`Difficulty`]: linkchain_types::Difficulty

pub mod entry;
pub mod error;
pub mod memory;
pub mod pow;
pub mod traits;
pub mod validation;

pub use entry::{Entry, GENESIS_PAYLOAD, GENESIS_TIMESTAMP};
pub use error::{LedgerError, RejectReason};
pub use memory::InMemoryLedger;
pub use pow::{mine, mine_cancellable, MineOutcome, MiningStats, CANCEL_POLL_INTERVAL};
pub use traits::{LedgerReader, LedgerWriter, TipRef};
pub use validation::{AuditReport, ChainAudit};
