//! Binary crate for the `onecall` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Running one fetch or transform cycle outside a host runtime
//! - Human-friendly output formatting

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cmd = cli::Cli::parse();
    cmd.run().await
}
