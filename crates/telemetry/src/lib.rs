// Path: crates/telemetry/src/lib.rs
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

//! # Pylons Telemetry
//!
//! Structured logging initialization for integration test runs. Tests that
//! run outside a libtest harness route their records through the global
//! `tracing` subscriber installed here.

/// The initialization routines for global structured logging.
pub mod init;

pub use init::{init_tracing, init_tracing_with_filter, try_init_tracing};
