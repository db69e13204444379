use clap::Parser;
use tracing::Level;

mod cli;
mod commands;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let level = cli
        .log_level
        .unwrap_or(if cli.verbose { Level::DEBUG } else { Level::INFO });
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_thread_names(true)
        .init();
    commands::run_command(cli)
}
