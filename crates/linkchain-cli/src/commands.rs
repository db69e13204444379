use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;

use linkchain_ledger::{AuditReport, ChainAudit, Entry, LedgerReader};
use linkchain_node::{open_transport, Node, NodeConfig, NodeReport};
use linkchain_types::Difficulty;

use crate::cli::{Cli, OutputFormat};

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = build_config(&cli)?;
    let transport = open_transport(&config).with_context(|| {
        format!("cannot open {} transport on {}", config.transport, config.device)
    })?;

    if cli.format == OutputFormat::Text {
        println!(
            "{} Linkchain node on {} ({}), {} miners, difficulty {}",
            "▶".cyan().bold(),
            config.device.bold(),
            config.transport,
            config.num_miners.to_string().bold(),
            config.difficulty.to_string().yellow(),
        );
        match config.max_height {
            Some(height) => println!("  Mining until height {}", height.to_string().bold()),
            None => println!("  Mining until interrupted"),
        }
    }

    let handle = Node::start(config, transport)?;
    let ledger = Arc::clone(handle.ledger());
    let report = handle.wait()?;

    let entries = ledger.entries()?;
    let audit = ChainAudit::audit(ledger.as_ref())?;
    match cli.format {
        OutputFormat::Text => print_text(&entries, &report, &audit),
        OutputFormat::Json => print_json(&entries, &report, &audit)?,
    }

    if !audit.is_valid() {
        anyhow::bail!("chain audit failed");
    }
    Ok(())
}

/// Defaults, then the config file, then flags.
pub fn build_config(cli: &Cli) -> anyhow::Result<NodeConfig> {
    let mut config = match &cli.config {
        Some(path) => NodeConfig::load(path)
            .with_context(|| format!("cannot load config {}", path.display()))?,
        None => NodeConfig::default(),
    };

    if let Some(miners) = cli.miners {
        config.num_miners = miners;
    }
    if let Some(device) = &cli.device {
        config.device = device.clone();
    }
    if let Some(difficulty) = cli.difficulty {
        config.difficulty = Difficulty::new(difficulty)?;
    }
    if let Some(transport) = cli.transport {
        config.transport = transport.into();
    }
    if let Some(height) = cli.max_height {
        config.max_height = Some(height);
    }
    if let Some(pause) = cli.pause_ms {
        config.pause_ms = pause;
    }

    config.validate()?;
    Ok(config)
}

fn print_text(entries: &[Entry], report: &NodeReport, audit: &AuditReport) {
    println!();
    for entry in entries {
        println!(
            "{}  {}  {}",
            format!("#{}", entry.index()).yellow(),
            entry.digest().short_hex().dimmed(),
            entry.payload()
        );
    }
    println!();
    println!(
        "Mined {} ({} stale, {} cancelled), received {}, broadcast {} ({} failed)",
        report.pool.committed.to_string().bold(),
        report.pool.stale,
        report.pool.cancelled,
        report.listener.committed.to_string().bold(),
        report.broadcast_sent,
        report.broadcast_failed,
    );
    match &audit.violation {
        None => println!(
            "{} Chain of {} entries verified, tip {}",
            "✓".green().bold(),
            audit.length,
            audit.tip.digest.short_hex().cyan()
        ),
        Some(violation) => println!("{} Chain audit failed: {}", "✗".red().bold(), violation),
    }
}

fn print_json(entries: &[Entry], report: &NodeReport, audit: &AuditReport) -> anyhow::Result<()> {
    let value = serde_json::json!({
        "height": report.height,
        "valid": audit.is_valid(),
        "violation": audit.violation.as_ref().map(ToString::to_string),
        "mined": report.pool.committed,
        "stale": report.pool.stale,
        "received": report.listener.committed,
        "malformed": report.listener.malformed,
        "entries": entries,
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
