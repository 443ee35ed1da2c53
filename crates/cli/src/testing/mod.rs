// Path: crates/cli/src/testing/mod.rs
//! Helpers for end-to-end tests that shell out to the node daemon.

pub mod account;
pub mod assert;
pub mod config;
pub mod exec;
pub mod status;
pub mod util;

pub use account::{Balances, BaseAccount, Coin};
pub use assert::{wait_for_block_interval, wait_for_next_block};
pub use config::{CliOptions, PollPolicy};
pub use exec::{
    keyring_backend_setup, node_flag_setup, CommandOutput, CommandRunner, NodeCli, ProcessRunner,
    RawOutput,
};
pub use status::{NodeStatus, StatusSource, SyncInfo};
pub use util::{clean_file, extract_tx_hash, json_formatter, read_file};
