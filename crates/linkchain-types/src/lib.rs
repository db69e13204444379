//! Foundation types for Linkchain.
//!
//! Every other Linkchain crate depends on `linkchain-types`.
//!
//! # Key Types
//!
//! - [`Digest`]: 32-byte entry digest with a fixed-width hex form
//! - [`Difficulty`]: required count of leading `'0'` hex characters

pub mod difficulty;
pub mod digest;
pub mod error;

pub use difficulty::{Difficulty, MAX_DIFFICULTY};
pub use digest::{Digest, DIGEST_HEX_LEN};
pub use error::TypeError;
