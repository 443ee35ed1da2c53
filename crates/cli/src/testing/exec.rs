// Path: crates/cli/src/testing/exec.rs

use super::config::{CliOptions, PollPolicy};
use crate::error::CliError;
use log::{debug, trace};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use rand::Rng;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

// Only one daemon command runs at a time across the whole test process.
static CLI_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub const KEYRING_BACKEND_FLAG: &str = "--keyring-backend";
pub const KEYRING_BACKEND_TEST: &str = "test";
pub const NODE_FLAG: &str = "--node";

/// Appends `--keyring-backend test` to commands that touch the keyring:
/// `keys *`, `tx sign` and `tx pylons create-account`.
pub fn keyring_backend_setup(mut args: Vec<String>) -> Vec<String> {
    let first = args.first().map(String::as_str);
    let second = args.get(1).map(String::as_str);
    let third = args.get(2).map(String::as_str);

    let needs_keyring = match (first, second, third) {
        (Some("keys"), _, _) => true,
        (Some("tx"), Some("sign"), _) => true,
        (Some("tx"), Some("pylons"), Some("create-account")) => true,
        _ => false,
    };
    if needs_keyring {
        args.push(KEYRING_BACKEND_FLAG.to_string());
        args.push(KEYRING_BACKEND_TEST.to_string());
    }
    args
}

/// Appends `--node <endpoint>` to `query`, `tx` and `status` commands, with
/// the endpoint drawn uniformly from `nodes`.
pub fn node_flag_setup<R: Rng + ?Sized>(
    mut args: Vec<String>,
    nodes: &[String],
    rng: &mut R,
) -> Vec<String> {
    let targets_node = matches!(
        args.first().map(String::as_str),
        Some("query" | "tx" | "status")
    );
    if targets_node {
        if let Some(node) = nodes.choose(rng) {
            args.push(NODE_FLAG.to_string());
            args.push(node.clone());
        }
    }
    args
}

/// What a finished process produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawOutput {
    /// Stdout followed by stderr.
    pub combined: Vec<u8>,
    pub exit_code: Option<i32>,
    pub success: bool,
}

/// Runs one external command to completion.
pub trait CommandRunner {
    fn run(&self, program: &Path, args: &[String], stdin: &str) -> io::Result<RawOutput>;
}

/// Spawns the daemon as a child process.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, program: &Path, args: &[String], stdin: &str) -> io::Result<RawOutput> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Fed from a separate thread so a child that fills its stdout pipe
        // before reading stdin cannot deadlock us. A child that exits
        // without reading all of its input is not an error.
        let writer = match child.stdin.take() {
            Some(mut pipe) if !stdin.is_empty() => {
                let input = stdin.as_bytes().to_vec();
                Some(thread::spawn(move || match pipe.write_all(&input) {
                    Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                    other => other,
                }))
            }
            // Dropping the pipe closes it so the child sees EOF.
            _ => None,
        };

        let output = child.wait_with_output()?;
        if let Some(writer) = writer {
            writer
                .join()
                .map_err(|_| io::Error::other("stdin writer panicked"))??;
        }
        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);
        Ok(RawOutput {
            combined,
            exit_code: output.status.code(),
            success: output.status.success(),
        })
    }
}

/// Output of a successful command plus a human-readable record of the call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandOutput {
    pub output: Vec<u8>,
    /// `"pylonsd <args>" ==>` followed by the output.
    pub log: String,
}

impl CommandOutput {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

/// Entry point for every daemon command a test issues.
#[derive(Clone, Debug)]
pub struct NodeCli<R: CommandRunner = ProcessRunner> {
    options: CliOptions,
    poll: PollPolicy,
    daemon: PathBuf,
    runner: R,
}

impl NodeCli<ProcessRunner> {
    pub fn new(options: CliOptions) -> Self {
        Self::with_runner(options, ProcessRunner)
    }

    /// A client configured from `PYLONS_*` environment variables.
    pub fn from_env() -> Result<Self, clap::Error> {
        CliOptions::from_env().map(Self::new)
    }
}

impl<R: CommandRunner> NodeCli<R> {
    pub fn with_runner(options: CliOptions, runner: R) -> Self {
        let daemon = options.daemon_path();
        Self {
            options,
            poll: PollPolicy::default(),
            daemon,
            runner,
        }
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn options(&self) -> &CliOptions {
        &self.options
    }

    pub fn poll_policy(&self) -> &PollPolicy {
        &self.poll
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// The argument vector actually passed to the daemon for `args`.
    pub fn prepare_args(&self, args: &[&str]) -> Vec<String> {
        let args = args.iter().map(|a| a.to_string()).collect();
        let args = node_flag_setup(args, &self.options.custom_nodes(), &mut rand::thread_rng());
        keyring_backend_setup(args)
    }

    /// Runs the daemon with `args`, feeding `stdin_input` on standard input.
    ///
    /// Calls are serialized process-wide. A non-zero exit is returned as
    /// [`CliError::CommandFailed`] carrying the output and the call log.
    pub fn invoke(&self, args: &[&str], stdin_input: &str) -> Result<CommandOutput, CliError> {
        let args = self.prepare_args(args);
        debug!("{} {}", self.daemon_label(), args.join(" "));

        let raw = {
            let _guard = CLI_LOCK.lock();
            self.runner.run(&self.daemon, &args, stdin_input)
        }
        .map_err(|source| CliError::Spawn {
            program: self.daemon.display().to_string(),
            source,
        })?;

        let log = format!(
            "\"{} {}\" ==>\n{}\n",
            self.daemon_label(),
            args.join(" "),
            String::from_utf8_lossy(&raw.combined)
        );
        trace!("{}", log);

        if raw.success {
            Ok(CommandOutput {
                output: raw.combined,
                log,
            })
        } else {
            Err(CliError::CommandFailed {
                exit_code: raw.exit_code,
                output: raw.combined,
                log,
            })
        }
    }

    fn daemon_label(&self) -> String {
        self.daemon
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.daemon.display().to_string())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::VecDeque;

    /// Records every call and replays canned outputs in order.
    #[derive(Default)]
    pub(crate) struct ScriptedRunner {
        pub calls: Mutex<Vec<(Vec<String>, String)>>,
        pub replies: Mutex<VecDeque<RawOutput>>,
    }

    impl ScriptedRunner {
        pub fn reply(self, text: &str, success: bool) -> Self {
            self.replies.lock().push_back(RawOutput {
                combined: text.as_bytes().to_vec(),
                exit_code: Some(if success { 0 } else { 1 }),
                success,
            });
            self
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, _program: &Path, args: &[String], stdin: &str) -> io::Result<RawOutput> {
            self.calls.lock().push((args.to_vec(), stdin.to_string()));
            Ok(self.replies.lock().pop_front().unwrap_or(RawOutput {
                combined: Vec::new(),
                exit_code: Some(0),
                success: true,
            }))
        }
    }

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_keyring_flag_for_keyring_commands() {
        assert_eq!(
            keyring_backend_setup(strings(&["keys", "show", "alice", "-a"])),
            strings(&["keys", "show", "alice", "-a", "--keyring-backend", "test"])
        );
        assert_eq!(
            keyring_backend_setup(strings(&["tx", "sign", "tx.json"])).last().unwrap(),
            "test"
        );
        assert_eq!(
            keyring_backend_setup(strings(&["tx", "pylons", "create-account", "--from", "bob"]))
                .len(),
            7
        );
    }

    #[test]
    fn test_keyring_flag_skipped_elsewhere() {
        for args in [
            vec![],
            strings(&["tx"]),
            strings(&["tx", "pylons", "create-cookbook"]),
            strings(&["tx", "bank", "send"]),
            strings(&["query", "account", "X"]),
            strings(&["status"]),
        ] {
            assert_eq!(keyring_backend_setup(args.clone()), args);
        }
    }

    #[test]
    fn test_node_flag_picks_one_configured_node() {
        let nodes = strings(&["tcp://a:26657", "tcp://b:26657"]);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let args = node_flag_setup(strings(&["query", "account", "X"]), &nodes, &mut rng);
            assert_eq!(args.len(), 5);
            assert_eq!(&args[..3], &strings(&["query", "account", "X"])[..]);
            assert_eq!(args[3], "--node");
            assert!(nodes.contains(&args[4]));
        }
    }

    #[test]
    fn test_node_flag_reaches_every_node() {
        let nodes = strings(&["tcp://a:26657", "tcp://b:26657"]);
        let mut rng = StdRng::seed_from_u64(42);
        let picked: std::collections::BTreeSet<String> = (0..64)
            .map(|_| node_flag_setup(strings(&["status"]), &nodes, &mut rng)[2].clone())
            .collect();
        assert_eq!(picked.len(), 2);
    }

    #[test]
    fn test_node_flag_skipped_for_local_commands() {
        let nodes = strings(&["tcp://a:26657"]);
        let mut rng = StdRng::seed_from_u64(1);
        let args = strings(&["keys", "list"]);
        assert_eq!(node_flag_setup(args.clone(), &nodes, &mut rng), args);
        let args = strings(&["status"]);
        assert_eq!(node_flag_setup(args.clone(), &[], &mut rng), args);
    }

    #[test]
    fn test_invoke_rewrites_arguments() {
        let options = CliOptions {
            custom_node: "tcp://a:26657,tcp://b:26657".to_string(),
            daemon: Some(PathBuf::from("/usr/local/bin/pylonsd")),
            ..CliOptions::default()
        };
        let cli = NodeCli::with_runner(options, ScriptedRunner::default());

        cli.invoke(&["keys", "show", "alice", "-a"], "").unwrap();
        cli.invoke(&["query", "account", "X"], "").unwrap();
        cli.invoke(&["tx", "sign", "tx.json"], "passphrase\n").unwrap();

        let calls = cli.runner().calls.lock();
        assert_eq!(
            calls[0].0,
            strings(&["keys", "show", "alice", "-a", "--keyring-backend", "test"])
        );

        let query = &calls[1].0;
        assert_eq!(query.len(), 5);
        assert_eq!(query[3], "--node");
        assert!(query[4] == "tcp://a:26657" || query[4] == "tcp://b:26657");

        // Node flag first, keyring flag second.
        let sign = &calls[2].0;
        assert_eq!(sign[3], "--node");
        assert_eq!(&sign[5..], &strings(&["--keyring-backend", "test"])[..]);
        assert_eq!(calls[2].1, "passphrase\n");
    }

    #[test]
    fn test_invoke_reports_failure_with_log() {
        let options = CliOptions {
            daemon: Some(PathBuf::from("pylonsd")),
            ..CliOptions::default()
        };
        let runner = ScriptedRunner::default()
            .reply("pylo1qqq\n", true)
            .reply("Error: key not found", false);
        let cli = NodeCli::with_runner(options, runner);

        let ok = cli.invoke(&["keys", "show", "alice", "-a"], "").unwrap();
        assert_eq!(ok.text(), "pylo1qqq\n");
        assert_eq!(
            ok.log,
            "\"pylonsd keys show alice -a --keyring-backend test\" ==>\npylo1qqq\n\n"
        );

        let err = cli.invoke(&["keys", "show", "mallory", "-a"], "").unwrap_err();
        match &err {
            CliError::CommandFailed {
                exit_code, output, ..
            } => {
                assert_eq!(*exit_code, Some(1));
                assert_eq!(output, b"Error: key not found");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(err.command_log().unwrap().contains("mallory"));
    }

    #[test]
    fn test_spawn_failure_is_reported() {
        let options = CliOptions {
            daemon: Some(PathBuf::from("/nonexistent/pylonsd-missing")),
            ..CliOptions::default()
        };
        let cli = NodeCli::new(options);
        let err = cli.invoke(&["version"], "").unwrap_err();
        assert!(matches!(err, CliError::Spawn { .. }), "got {:?}", err);
    }
}
