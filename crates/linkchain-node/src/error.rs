use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("sync error: {0}")]
    Sync(#[from] linkchain_sync::SyncError),

    #[error("ledger error: {0}")]
    Ledger(#[from] linkchain_ledger::LedgerError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("thread {0} panicked")]
    ThreadPanicked(String),
}

pub type NodeResult<T> = Result<T, NodeError>;
