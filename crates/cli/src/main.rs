// Path: crates/cli/src/main.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! # Pylons Integration Test CLI
//!
//! Thin command line over the test helpers, for poking at a running node
//! from a shell or a CI step.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pylons_cli::{extract_tx_hash, CliOptions, NodeCli};
use pylons_test_utils::{LibtestHandle, LogLevel, TestContext};
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "pylons-inttest",
    version,
    about = "Helpers for driving a Pylons node from end-to-end tests.",
    long_about = "Runs the same command, polling and parsing helpers the integration tests use, against the node given by --node or PYLONS_NODE."
)]
struct Cli {
    #[clap(flatten)]
    options: CliOptions,

    /// Threshold for log records written to stderr.
    #[clap(long, env = "PYLONS_LOG_LEVEL", default_value = "info")]
    log_level: LogLevel,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the latest block height reported by the daemon.
    Status,

    /// Block until the chain advances by COUNT blocks.
    WaitBlocks {
        /// Defaults to the configured max wait block.
        count: Option<u64>,
    },

    /// Extract the tx hash from broadcast output (FILE, or stdin).
    TxHash { file: Option<PathBuf> },

    /// Print the address of a local key.
    AccountAddr { name: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    pylons_telemetry::init_tracing_with_filter(cli.log_level.as_filter_directive())?;

    let node = NodeCli::new(cli.options);
    match cli.command {
        Commands::Status => {
            let status = node.get_daemon_status()?;
            println!("{}", status.latest_block_height());
        }
        Commands::WaitBlocks { count } => {
            let count = count.unwrap_or_else(|| node.options().max_wait_block());
            let height = node.wait_for_block_interval(count)?;
            println!("{}", height);
        }
        Commands::TxHash { file } => {
            let text = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf).context("reading stdin")?;
                    buf
                }
            };
            let hash = extract_tx_hash(&text);
            if hash.is_empty() {
                bail!("no txhash found in input");
            }
            println!("{}", hash);
        }
        Commands::AccountAddr { name } => {
            let t = TestContext::<LibtestHandle>::standalone();
            println!("{}", node.get_account_addr(&name, &t));
        }
    }
    Ok(())
}
