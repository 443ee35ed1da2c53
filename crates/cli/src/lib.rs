// Path: crates/cli/src/lib.rs
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

//! # Pylons CLI Test Helpers
//!
//! Helpers for end-to-end tests that drive a node through its `pylonsd`
//! command line: argument rewriting (keyring backend, node selection),
//! serialized command execution, status polling until the chain advances,
//! and extraction of values such as the tx hash from command output.
//!
//! Failures that belong to the calling test are reported through a
//! [`pylons_test_utils::TestContext`]; everything else is returned as a
//! [`CliError`].

pub mod error;
pub mod testing;

pub use error::{CliError, ErrorCode};
pub use testing::assert::{wait_for_block_interval, wait_for_next_block};
pub use testing::config::{CliOptions, PollPolicy};
pub use testing::exec::{CommandOutput, CommandRunner, NodeCli, ProcessRunner};
pub use testing::status::{NodeStatus, StatusSource};
pub use testing::util::extract_tx_hash;
