// Path: crates/cli/src/error.rs
//! Error types for the command helpers.

use std::path::PathBuf;
use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

#[derive(Debug, Error)]
pub enum CliError {
    /// The daemon binary could not be started at all.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// The daemon ran and exited unsuccessfully.
    #[error("command exited with status {}: {log}", exit_label(.exit_code))]
    CommandFailed {
        exit_code: Option<i32>,
        output: Vec<u8>,
        log: String,
    },
    /// Command output was not the JSON we expected. `payload` holds the raw text.
    #[error("failed to decode {what}: {source}")]
    Decode {
        what: &'static str,
        payload: String,
        #[source]
        source: serde_json::Error,
    },
    /// Node status could not be retrieved while waiting for blocks.
    #[error("could not get daemon status: {0}")]
    StatusUnavailable(#[source] Box<CliError>),
    /// The chain did not advance far enough before the poll budget ran out.
    #[error(
        "waited too long for {interval} block(s) past height {start_height}: last seen {last_height} after {polls} polls"
    )]
    WaitTimeout {
        interval: u64,
        start_height: u64,
        last_height: u64,
        polls: u64,
    },
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "<killed by signal>".to_string(),
    }
}

impl CliError {
    /// The `"pylonsd ..." ==> output` log of the failed command, if any.
    pub fn command_log(&self) -> Option<&str> {
        match self {
            Self::CommandFailed { log, .. } => Some(log),
            Self::StatusUnavailable(inner) => inner.command_log(),
            _ => None,
        }
    }

    /// The raw payload that failed to decode, if any.
    pub fn payload(&self) -> Option<&str> {
        match self {
            Self::Decode { payload, .. } => Some(payload),
            Self::StatusUnavailable(inner) => inner.payload(),
            _ => None,
        }
    }
}

impl ErrorCode for CliError {
    fn code(&self) -> &'static str {
        match self {
            Self::Spawn { .. } => "CLI_SPAWN_FAILED",
            Self::CommandFailed { .. } => "CLI_COMMAND_FAILED",
            Self::Decode { .. } => "CLI_DECODE_FAILED",
            Self::StatusUnavailable(_) => "CLI_STATUS_UNAVAILABLE",
            Self::WaitTimeout { .. } => "CLI_WAIT_TIMEOUT",
            Self::Io { .. } => "CLI_IO_ERROR",
        }
    }
}
