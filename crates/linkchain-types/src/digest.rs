use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Width of a digest rendered as lowercase hex.
pub const DIGEST_HEX_LEN: usize = 64;

/// Output of the entry digest function.
///
/// The hex form is what difficulty is measured against and what an entry's
/// successor stores as its `previous_hash`. The all-zero digest doubles as the
/// sentinel `previous_hash` of the genesis entry.
///
/// Human-readable formats carry the hex form; binary formats carry the 32
/// raw bytes with no length prefix.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Sentinel used as the genesis entry's `previous_hash`.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Wrap a pre-computed hash.
    pub const fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// Returns `true` for the genesis sentinel.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// The raw 32-byte hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Number of leading `'0'` characters in the hex form.
    ///
    /// Computed on the bytes directly: a zero byte is two hex zeros, a byte
    /// below `0x10` contributes one more and ends the run.
    pub fn leading_zero_nibbles(&self) -> u32 {
        let mut zeros = 0u32;
        for byte in self.0 {
            if byte == 0 {
                zeros += 2;
                continue;
            }
            if byte < 0x10 {
                zeros += 1;
            }
            break;
        }
        zeros
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.short_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 32]> for Digest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<Digest> for [u8; 32] {
    fn from(digest: Digest) -> Self {
        digest.0
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Digest::from_hex(&s).map_err(serde::de::Error::custom)
        } else {
            <[u8; 32]>::deserialize(deserializer).map(Self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_is_all_zeros() {
        assert!(Digest::ZERO.is_zero());
        assert_eq!(Digest::ZERO.to_hex(), "0".repeat(DIGEST_HEX_LEN));
        assert_eq!(Digest::ZERO.leading_zero_nibbles(), 64);
    }

    #[test]
    fn hex_roundtrip() {
        let digest = Digest::from_hash([0xab; 32]);
        let parsed = Digest::from_hex(&digest.to_hex()).unwrap();
        assert_eq!(digest, parsed);
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        let err = Digest::from_hex("abcd").unwrap_err();
        assert_eq!(err, TypeError::InvalidLength { expected: 32, actual: 2 });
    }

    #[test]
    fn from_hex_rejects_garbage() {
        assert!(matches!(Digest::from_hex("zz"), Err(TypeError::InvalidHex(_))));
    }

    #[test]
    fn short_hex_is_8_chars() {
        assert_eq!(Digest::from_hash([7; 32]).short_hex().len(), 8);
    }

    #[test]
    fn display_is_full_hex() {
        let digest = Digest::from_hash([0x12; 32]);
        let display = format!("{digest}");
        assert_eq!(display.len(), DIGEST_HEX_LEN);
        assert_eq!(display, digest.to_hex());
    }

    #[test]
    fn leading_zero_nibbles_counts_half_bytes() {
        let mut bytes = [0xff; 32];
        bytes[0] = 0x00;
        bytes[1] = 0x0a;
        assert_eq!(Digest::from_hash(bytes).leading_zero_nibbles(), 3);

        bytes[1] = 0xa0;
        assert_eq!(Digest::from_hash(bytes).leading_zero_nibbles(), 2);

        assert_eq!(Digest::from_hash([0xff; 32]).leading_zero_nibbles(), 0);
    }

    #[test]
    fn serde_roundtrip() {
        let digest = Digest::from_hash([3; 32]);
        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(json, format!("\"{}\"", digest.to_hex()));
        let parsed: Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(digest, parsed);
    }

    #[test]
    fn json_rejects_malformed_hex() {
        assert!(serde_json::from_str::<Digest>("\"nothex\"").is_err());
        assert!(serde_json::from_str::<Digest>("\"abcd\"").is_err());
    }

    proptest! {
        #[test]
        fn leading_zero_nibbles_matches_hex(bytes in any::<[u8; 32]>()) {
            let digest = Digest::from_hash(bytes);
            let expected = digest.to_hex().chars().take_while(|c| *c == '0').count() as u32;
            prop_assert_eq!(digest.leading_zero_nibbles(), expected);
        }
    }
}
