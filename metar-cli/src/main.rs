//! Binary crate for the `metar` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Turning lookup outcomes into reply text

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod reply;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the reply; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
