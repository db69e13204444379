use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use linkchain_types::Difficulty;

use crate::error::{NodeError, NodeResult};

pub const DEFAULT_MINERS: usize = 10;
pub const DEFAULT_DEVICE: &str = "enp5s0";
pub const DEFAULT_PAUSE_MS: u64 = 100;
pub const DEFAULT_PAYLOAD_PREFIX: &str = "Block from miner";

/// Which link the node gossips over.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Raw Ethernet frames on `device` (Linux, needs `CAP_NET_RAW`).
    #[default]
    Raw,
    /// In-process hub; the node hears only itself.
    Loopback,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw => f.write_str("raw"),
            Self::Loopback => f.write_str("loopback"),
        }
    }
}

impl FromStr for TransportKind {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "loopback" => Ok(Self::Loopback),
            other => Err(NodeError::Config(format!(
                "unknown transport '{other}' (expected raw or loopback)"
            ))),
        }
    }
}

/// Node settings, loadable from TOML.
///
/// Every field has a default, so an empty file is a valid config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeConfig {
    pub difficulty: Difficulty,
    pub num_miners: usize,
    pub device: String,
    pub transport: TransportKind,
    /// Pause between two mining attempts of one worker, in milliseconds.
    pub pause_ms: u64,
    /// Entry payloads read `"{payload_prefix} {miner id}"`.
    pub payload_prefix: String,
    /// Stop the node once the tip reaches this index.
    pub max_height: Option<u64>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            num_miners: DEFAULT_MINERS,
            device: DEFAULT_DEVICE.to_string(),
            transport: TransportKind::default(),
            pause_ms: DEFAULT_PAUSE_MS,
            payload_prefix: DEFAULT_PAYLOAD_PREFIX.to_string(),
            max_height: None,
        }
    }
}

impl NodeConfig {
    pub fn from_toml_str(text: &str) -> NodeResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> NodeResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> NodeResult<()> {
        if self.num_miners == 0 {
            return Err(NodeError::Config("num_miners must be at least 1".into()));
        }
        if self.device.trim().is_empty() {
            return Err(NodeError::Config("device must not be empty".into()));
        }
        Ok(())
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }

    pub fn payload_for(&self, miner: usize) -> String {
        format!("{} {miner}", self.payload_prefix)
    }
}
