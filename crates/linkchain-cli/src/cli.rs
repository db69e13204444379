use std::path::PathBuf;

use clap::Parser;
use tracing::Level;

use linkchain_node::TransportKind;

#[derive(Parser, Debug)]
#[command(
    name = "linkchain",
    about = "Linkchain: a proof-of-work ledger gossiped over raw Ethernet",
    version
)]
pub struct Cli {
    /// Number of mining threads
    #[arg(short = 'm', long = "miners")]
    pub miners: Option<usize>,

    /// Network interface to gossip on
    #[arg(short = 'd', long)]
    pub device: Option<String>,

    /// Leading zero hex digits required of every entry digest
    #[arg(long)]
    pub difficulty: Option<u32>,

    /// TOML config file; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub transport: Option<TransportArg>,

    /// Stop once the chain reaches this index
    #[arg(long)]
    pub max_height: Option<u64>,

    /// Pause between mining attempts, in milliseconds
    #[arg(long)]
    pub pause_ms: Option<u64>,

    #[arg(short, long)]
    pub verbose: bool,

    /// Log level (error, warn, info, debug, trace); overrides --verbose
    #[arg(long)]
    pub log_level: Option<Level>,

    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum TransportArg {
    Raw,
    Loopback,
}

impl From<TransportArg> for TransportKind {
    fn from(arg: TransportArg) -> Self {
        match arg {
            TransportArg::Raw => TransportKind::Raw,
            TransportArg::Loopback => TransportKind::Loopback,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
