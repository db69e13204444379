use std::fmt;

use serde::{Deserialize, Serialize};

use crate::digest::{Digest, DIGEST_HEX_LEN};
use crate::error::TypeError;

/// Largest representable difficulty: every hex character of the digest.
pub const MAX_DIFFICULTY: u32 = DIGEST_HEX_LEN as u32;

/// Number of leading `'0'` hex characters a valid digest must carry.
///
/// Fixed for the lifetime of a process; there is no retargeting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Difficulty(u8);

impl Difficulty {
    /// Accepts every digest.
    pub const ZERO: Self = Self(0);

    pub fn new(leading_zeros: u32) -> Result<Self, TypeError> {
        if leading_zeros > MAX_DIFFICULTY {
            return Err(TypeError::DifficultyOutOfRange {
                requested: leading_zeros,
                max: MAX_DIFFICULTY,
            });
        }
        Ok(Self(leading_zeros as u8))
    }

    pub fn leading_zeros(&self) -> u32 {
        u32::from(self.0)
    }

    /// Returns `true` if `digest` has at least the required leading zeros.
    pub fn is_met_by(&self, digest: &Digest) -> bool {
        digest.leading_zero_nibbles() >= self.leading_zeros()
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self(4)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for Difficulty {
    type Error = TypeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Difficulty> for u32 {
    fn from(difficulty: Difficulty) -> Self {
        difficulty.leading_zeros()
    }
}
