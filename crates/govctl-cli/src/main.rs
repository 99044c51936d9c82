#![forbid(unsafe_code)]

//! **govctl** – command-line governance control plane for packet-based
//! delivery: claim, preflight, heartbeat, review, and closeout operations
//! over a Deterministic Commitment Layer, plus its Verifier and Integrity
//! Runtime.
//!
//! Grounded on `toka-config-cli::main`'s synchronous parse-dispatch-exit
//! shape (no async runtime — every operation here is synchronous file I/O)
//! and `toka-cli::main`'s `init_tracing`/global-flag layout.

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use govctl_cli::cli::Cli;
use govctl_cli::commands;
use govctl_config::GovernanceConfig;

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let mut config = GovernanceConfig::from_env();
    if let Some(root) = &cli.root {
        config.root = root.clone();
    }

    let (report, exit_code) = commands::dispatch(&cli.command, &config);
    report.print();
    std::process::exit(exit_code);
}

fn init_tracing(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
