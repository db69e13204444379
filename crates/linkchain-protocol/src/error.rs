use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("bad frame magic: {0:02x?}")]
    BadMagic([u8; 4]),

    #[error("version mismatch: local {local}, remote {remote}")]
    VersionMismatch { local: u8, remote: u8 },

    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    #[error("framing error: {0}")]
    FramingError(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
