use bincode::Options;
use bytes::{Buf, BufMut, BytesMut};

use linkchain_ledger::Entry;

use crate::error::{ProtocolError, ProtocolResult};
use crate::message::{
    WireEntry, FRAME_MAGIC, HEADER_LEN, MAX_BODY_SIZE, MAX_FRAME_SIZE, PROTOCOL_VERSION,
};

/// Codec for gossip frames.
///
/// Layout: `[4 bytes magic][1 byte version][4 bytes body len, BE][body]`,
/// where the body is the fixed-width, big-endian bincode encoding of a
/// [`WireEntry`]. Bytes after the body are ignored so that link-layer
/// padding on short frames does not break decoding.
pub struct GossipCodec;

impl GossipCodec {
    /// Encode an entry into one frame.
    pub fn encode(entry: &Entry) -> ProtocolResult<Vec<u8>> {
        let body = body_options()
            .serialize(&WireEntry::from(entry))
            .map_err(|e| ProtocolError::Serialization(e.to_string()))?;

        let size = HEADER_LEN + body.len();
        if size > MAX_FRAME_SIZE {
            return Err(ProtocolError::FrameTooLarge {
                size,
                max: MAX_FRAME_SIZE,
            });
        }

        let mut buf = BytesMut::with_capacity(size);
        buf.put_slice(&FRAME_MAGIC);
        buf.put_u8(PROTOCOL_VERSION);
        buf.put_u32(body.len() as u32);
        buf.put_slice(&body);
        Ok(buf.to_vec())
    }

    /// Decode one frame into a candidate entry.
    ///
    /// The candidate's digest and nonce are taken as claimed; the ledger
    /// re-verifies both before committing.
    pub fn decode(frame: &[u8]) -> ProtocolResult<Entry> {
        if frame.len() < HEADER_LEN {
            return Err(ProtocolError::FramingError(format!(
                "too short: {} bytes, header needs {HEADER_LEN}",
                frame.len()
            )));
        }

        let mut header = &frame[..HEADER_LEN];
        let mut magic = [0u8; 4];
        header.copy_to_slice(&mut magic);
        if magic != FRAME_MAGIC {
            return Err(ProtocolError::BadMagic(magic));
        }

        let version = header.get_u8();
        if version != PROTOCOL_VERSION {
            return Err(ProtocolError::VersionMismatch {
                local: PROTOCOL_VERSION,
                remote: version,
            });
        }

        let len = header.get_u32() as usize;
        if len > MAX_BODY_SIZE {
            return Err(ProtocolError::FrameTooLarge {
                size: HEADER_LEN + len,
                max: MAX_FRAME_SIZE,
            });
        }

        let total = HEADER_LEN + len;
        if frame.len() < total {
            return Err(ProtocolError::FramingError(format!(
                "incomplete: have {}, need {total}",
                frame.len()
            )));
        }

        let wire: WireEntry = body_options()
            .deserialize(&frame[HEADER_LEN..total])
            .map_err(|e| ProtocolError::Deserialization(e.to_string()))?;
        Ok(wire.into())
    }
}

fn body_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_big_endian()
        .with_limit(MAX_BODY_SIZE as u64)
        .reject_trailing_bytes()
}

#[cfg(test)]
mod tests {
    use linkchain_types::{Difficulty, Digest};
    use proptest::prelude::*;

    use super::*;

    fn mined() -> Entry {
        linkchain_ledger::mine(
            Entry::draft(1, Entry::genesis().digest(), "Block from miner 3"),
            Difficulty::new(1).unwrap(),
        )
    }

    #[test]
    fn roundtrip_mined_entry() {
        let entry = mined();
        let frame = GossipCodec::encode(&entry).unwrap();
        assert_eq!(&frame[..4], b"LKCH");
        let decoded = GossipCodec::decode(&frame).unwrap();
        assert_eq!(decoded, entry);
        assert!(decoded.is_consistent());
    }

    #[test]
    fn whitespace_in_fields_survives() {
        let entry = Entry::draft_at(
            4,
            Digest::from_hash([0xcd; 32]),
            "Thu Oct 16 12:00:00 2026\n",
            "two words\tand a tab",
        );
        let decoded = GossipCodec::decode(&GossipCodec::encode(&entry).unwrap()).unwrap();
        assert_eq!(decoded.timestamp(), "Thu Oct 16 12:00:00 2026\n");
        assert_eq!(decoded.payload(), "two words\tand a tab");
        assert_eq!(decoded, entry);
    }

    #[test]
    fn trailing_padding_is_ignored() {
        let entry = mined();
        let mut frame = GossipCodec::encode(&entry).unwrap();
        frame.extend_from_slice(&[0u8; 32]);
        assert_eq!(GossipCodec::decode(&frame).unwrap(), entry);
    }

    #[test]
    fn truncated_payload_fails() {
        let frame = GossipCodec::encode(&mined()).unwrap();
        let err = GossipCodec::decode(&frame[..frame.len() - 5]).unwrap_err();
        assert!(matches!(err, ProtocolError::FramingError(_)));
    }

    #[test]
    fn short_body_length_fails_deserialization() {
        let mut frame = GossipCodec::encode(&mined()).unwrap();
        let len = u32::from_be_bytes([frame[5], frame[6], frame[7], frame[8]]);
        frame[5..9].copy_from_slice(&(len - 10).to_be_bytes());
        let err = GossipCodec::decode(&frame).unwrap_err();
        assert!(matches!(err, ProtocolError::Deserialization(_)));
    }

    #[test]
    fn header_only_fails() {
        let err = GossipCodec::decode(&[0, 0, 0]).unwrap_err();
        assert!(matches!(err, ProtocolError::FramingError(_)));
    }

    #[test]
    fn foreign_frame_has_bad_magic() {
        let err = GossipCodec::decode(b"1 0 Thu Oct 16 data hash 7").unwrap_err();
        assert!(matches!(err, ProtocolError::BadMagic(_)));
    }

    #[test]
    fn unknown_version_rejected() {
        let mut frame = GossipCodec::encode(&mined()).unwrap();
        frame[4] = 9;
        let err = GossipCodec::decode(&frame).unwrap_err();
        assert!(matches!(err, ProtocolError::VersionMismatch { local: 1, remote: 9 }));
    }

    #[test]
    fn oversized_declared_length_rejected() {
        let mut frame = GossipCodec::encode(&mined()).unwrap();
        frame[5..9].copy_from_slice(&u32::MAX.to_be_bytes());
        let err = GossipCodec::decode(&frame).unwrap_err();
        assert!(matches!(err, ProtocolError::FrameTooLarge { .. }));
    }

    #[test]
    fn payload_larger_than_mtu_rejected() {
        let entry = Entry::draft_at(1, Digest::ZERO, "t", "x".repeat(MAX_FRAME_SIZE));
        let err = GossipCodec::encode(&entry).unwrap_err();
        assert!(matches!(err, ProtocolError::FrameTooLarge { .. }));
    }

    #[test]
    fn invalid_utf8_payload_rejected() {
        let entry = Entry::draft_at(1, Digest::ZERO, "t", "ab");
        let mut frame = GossipCodec::encode(&entry).unwrap();
        let at = frame.len() - 32 - 8 - 2;
        frame[at] = 0xff;
        let err = GossipCodec::decode(&frame).unwrap_err();
        assert!(matches!(err, ProtocolError::Deserialization(_)));
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(
            index in any::<u64>(),
            prev in any::<[u8; 32]>(),
            timestamp in "\\PC{0,40}",
            payload in "\\PC{0,200}",
            nonce in any::<u64>(),
        ) {
            let mut entry = Entry::draft_at(index, Digest::from_hash(prev), timestamp, payload);
            entry.set_nonce(nonce);
            let decoded = GossipCodec::decode(&GossipCodec::encode(&entry).unwrap()).unwrap();
            prop_assert_eq!(decoded, entry);
        }

        #[test]
        fn arbitrary_bytes_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let _ = GossipCodec::decode(&bytes);
        }
    }
}
