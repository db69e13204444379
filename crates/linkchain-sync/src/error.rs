use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("transport unavailable on {device}: {reason}")]
    TransportUnavailable { device: String, reason: String },

    #[error("transport closed")]
    TransportClosed,

    #[error("frame of {size} bytes exceeds link MTU of {max}")]
    FrameTooLarge { size: usize, max: usize },

    #[error("protocol error: {0}")]
    Protocol(#[from] linkchain_protocol::ProtocolError),

    #[error("ledger error: {0}")]
    Ledger(#[from] linkchain_ledger::LedgerError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Errors worth retrying on the next receive call.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
