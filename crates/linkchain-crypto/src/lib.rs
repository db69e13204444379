//! Cryptographic primitives for Linkchain.
//!
//! Provides the domain-separated BLAKE3 entry digest and hash chain
//! verification. All crypto operations wrap established libraries; no
//! custom cryptography.

pub mod chain;
pub mod hasher;

pub use chain::{ChainError, ChainVerifier, Chained};
pub use hasher::{EntryHasher, EntryPreimage};
