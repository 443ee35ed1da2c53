// Path: crates/cli/src/testing/config.rs

use clap::{Args, Parser};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_NODE: &str = "tcp://localhost:26657";
pub const DEFAULT_REST_ENDPOINT: &str = "http://localhost:1317";
pub const DEFAULT_MAX_WAIT_BLOCK: u64 = 3;
pub const DEFAULT_MAX_BROADCAST_RETRY: usize = 50;
pub const DAEMON_NAME: &str = "pylonsd";

/// Options for reaching the node under test. Every flag can also be set
/// through its environment variable, which is how test binaries pick them up.
#[derive(Args, Clone, Debug, PartialEq, Eq)]
pub struct CliOptions {
    /// Comma-separated node RPC endpoints. Each query/tx/status command
    /// targets one of them at random.
    #[clap(long = "node", env = "PYLONS_NODE", default_value = DEFAULT_NODE)]
    pub custom_node: String,

    /// REST endpoint of the node.
    #[clap(long = "rest", env = "PYLONS_REST", default_value = DEFAULT_REST_ENDPOINT)]
    pub rest_endpoint: String,

    /// Blocks to wait for a transaction to land (0 means the default of 3).
    #[clap(long, env = "PYLONS_MAX_WAIT_BLOCK", default_value_t = 0)]
    pub max_wait_block: u64,

    /// Broadcast attempts before giving up (0 means the default of 50).
    #[clap(long = "max-broadcast", env = "PYLONS_MAX_BROADCAST", default_value_t = 0)]
    pub max_broadcast: usize,

    /// Path of the daemon binary. Defaults to `$GOPATH/bin/pylonsd`, then
    /// `pylonsd` on `PATH`.
    #[clap(long = "daemon", env = "PYLONS_DAEMON")]
    pub daemon: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct EnvOnly {
    #[clap(flatten)]
    options: CliOptions,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            custom_node: DEFAULT_NODE.to_string(),
            rest_endpoint: DEFAULT_REST_ENDPOINT.to_string(),
            max_wait_block: 0,
            max_broadcast: 0,
            daemon: None,
        }
    }
}

impl CliOptions {
    /// Builds options from `PYLONS_*` environment variables and defaults,
    /// without looking at the process arguments.
    pub fn from_env() -> Result<Self, clap::Error> {
        EnvOnly::try_parse_from(["pylons-inttest"]).map(|parsed| parsed.options)
    }

    pub fn max_wait_block(&self) -> u64 {
        if self.max_wait_block == 0 {
            DEFAULT_MAX_WAIT_BLOCK
        } else {
            self.max_wait_block
        }
    }

    pub fn max_broadcast_retry(&self) -> usize {
        if self.max_broadcast == 0 {
            DEFAULT_MAX_BROADCAST_RETRY
        } else {
            self.max_broadcast
        }
    }

    /// The configured endpoints, trimmed, with empty entries dropped.
    pub fn custom_nodes(&self) -> Vec<String> {
        self.custom_node
            .split(',')
            .map(str::trim)
            .filter(|node| !node.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn daemon_path(&self) -> PathBuf {
        if let Some(path) = &self.daemon {
            return path.clone();
        }
        if let Some(gopath) = std::env::var_os("GOPATH") {
            let candidate = PathBuf::from(gopath).join("bin").join(DAEMON_NAME);
            if candidate.is_file() {
                return candidate;
            }
        }
        PathBuf::from(DAEMON_NAME)
    }
}

/// Spacing and budget for block-height polling. The budget is
/// `iterations_per_block` polls for every block waited on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub iterations_per_block: u64,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            iterations_per_block: 300,
        }
    }
}

impl PollPolicy {
    pub fn max_polls(&self, blocks: u64) -> u64 {
        self.iterations_per_block.saturating_mul(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_limits_fall_back_to_defaults() {
        let opts = CliOptions::default();
        assert_eq!(opts.max_wait_block(), 3);
        assert_eq!(opts.max_broadcast_retry(), 50);

        let opts = CliOptions {
            max_wait_block: 7,
            max_broadcast: 2,
            ..CliOptions::default()
        };
        assert_eq!(opts.max_wait_block(), 7);
        assert_eq!(opts.max_broadcast_retry(), 2);
    }

    #[test]
    fn test_custom_nodes_split_and_trim() {
        let opts = CliOptions {
            custom_node: "tcp://a:26657, tcp://b:26657,,".to_string(),
            ..CliOptions::default()
        };
        assert_eq!(opts.custom_nodes(), vec!["tcp://a:26657", "tcp://b:26657"]);
        assert!(CliOptions {
            custom_node: String::new(),
            ..CliOptions::default()
        }
        .custom_nodes()
        .is_empty());
    }

    #[test]
    fn test_explicit_daemon_path_wins() {
        let opts = CliOptions {
            daemon: Some(PathBuf::from("/opt/pylons/pylonsd")),
            ..CliOptions::default()
        };
        assert_eq!(opts.daemon_path(), PathBuf::from("/opt/pylons/pylonsd"));
    }

    #[test]
    fn test_flags_parse() {
        #[derive(Parser)]
        struct Probe {
            #[clap(flatten)]
            options: CliOptions,
        }
        let probe = Probe::try_parse_from([
            "probe",
            "--node",
            "tcp://x:1,tcp://y:2",
            "--max-wait-block",
            "5",
            "--max-broadcast",
            "9",
        ])
        .unwrap();
        assert_eq!(probe.options.custom_nodes().len(), 2);
        assert_eq!(probe.options.max_wait_block(), 5);
        assert_eq!(probe.options.max_broadcast_retry(), 9);
    }

    #[test]
    fn test_poll_budget_scales_with_blocks() {
        let policy = PollPolicy::default();
        assert_eq!(policy.max_polls(1), 300);
        assert_eq!(policy.max_polls(3), 900);
    }
}
