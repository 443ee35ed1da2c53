// Path: crates/cli/tests/fake_daemon_e2e.rs
#![cfg(unix)]

use pylons_cli::{extract_tx_hash, CliError, CliOptions, NodeCli, PollPolicy};
use pylons_test_utils::{fields, TestContext};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::Duration;

// Stands in for the daemon: `status` reports a height that grows by one per
// call, `fail` exits non-zero, `echo-stdin` copies its input back, anything
// else echoes its arguments without reading stdin.
const FAKE_DAEMON: &str = r#"#!/bin/sh
dir="$(dirname "$0")"
case "$1" in
  status)
    h=$(cat "$dir/height")
    h=$((h + 1))
    echo "$h" > "$dir/height"
    printf '{"SyncInfo":{"latest_block_height":"%s","catching_up":false}}\n' "$h"
    ;;
  fail)
    echo "Error: rpc error: code = NotFound" >&2
    exit 3
    ;;
  echo-stdin)
    cat
    ;;
  tx)
    cat > /dev/null
    printf '{"height":"0","txhash":"E3B0C442","code":0}\n'
    ;;
  *)
    echo "$@"
    ;;
esac
"#;

fn install_fake_daemon(dir: &Path) -> std::path::PathBuf {
    let script = dir.join("pylonsd");
    fs::write(&script, FAKE_DAEMON).unwrap();
    fs::write(dir.join("height"), "10\n").unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    script
}

// One test function so the script is written once and never executed while
// another thread still holds it open for writing.
#[test]
fn test_helpers_against_fake_daemon() {
    let dir = tempfile::tempdir().unwrap();
    let options = CliOptions {
        custom_node: "tcp://10.0.0.1:26657,tcp://10.0.0.2:26657".to_string(),
        daemon: Some(install_fake_daemon(dir.path())),
        ..CliOptions::default()
    };
    let cli = NodeCli::new(options).with_poll_policy(PollPolicy {
        interval: Duration::from_millis(5),
        iterations_per_block: 20,
    });
    let t = TestContext::for_current_test().with_fields(fields! { "suite" => "fake-daemon" });

    assert!(t.run("status", |t| {
        let status = t.must_be_ok(cli.get_daemon_status());
        assert_eq!(status.latest_block_height(), 11);
        assert!(!status.sync_info.catching_up);
    }));

    assert!(t.run("wait for blocks", |t| {
        // Start height 12, then one poll per block.
        let height = t.must_be_ok(cli.wait_for_block_interval(2));
        assert_eq!(height, 14);
        let height = t.must_be_ok(cli.wait_for_next_block());
        assert_eq!(height, 16);
    }));

    assert!(t.run("flag injection", |t| {
        let out = t.must_be_ok(cli.invoke(&["keys", "show", "alice", "-a"], ""));
        let echoed = out.text();
        assert!(echoed.starts_with("keys show alice -a"), "{}", echoed);
        assert!(echoed.trim_end().ends_with("--keyring-backend test"), "{}", echoed);
        assert!(!echoed.contains("--node"));

        let out = t.must_be_ok(cli.invoke(&["query", "bank", "balances", "pylo1xyz"], ""));
        let echoed = out.text();
        assert!(
            echoed.contains("--node tcp://10.0.0.1:26657")
                || echoed.contains("--node tcp://10.0.0.2:26657"),
            "{}",
            echoed
        );
        assert!(out.log.starts_with("\"pylonsd query bank balances pylo1xyz --node "));
    }));

    assert!(t.run("tx hash", |t| {
        let out = t.must_be_ok(cli.invoke(&["tx", "bank", "send", "alice", "bob", "1upylon"], "y\n"));
        assert_eq!(extract_tx_hash(&out.text()), "E3B0C442");
    }));

    assert!(t.run("unread stdin", |t| {
        // Far more than a pipe buffer; the daemon exits without reading it.
        let input = "y\n".repeat(1 << 20);
        let out = t.must_be_ok(cli.invoke(&["keys", "list"], &input));
        assert_eq!(out.text().trim_end(), "keys list --keyring-backend test");
    }));

    assert!(t.run("large stdin echoed back", |t| {
        let input = "passphrase\n".repeat(1 << 16);
        let out = t.must_be_ok(cli.invoke(&["echo-stdin"], &input));
        assert_eq!(out.output.len(), input.len());
        assert_eq!(out.text(), input);
    }));

    assert!(t.run("command failure", |_| {
        match cli.invoke(&["fail"], "") {
            Err(CliError::CommandFailed { exit_code, output, log }) => {
                assert_eq!(exit_code, Some(3));
                assert!(String::from_utf8_lossy(&output).contains("code = NotFound"));
                assert!(log.starts_with("\"pylonsd fail\" ==>\n"));
            }
            other => panic!("expected CommandFailed, got {:?}", other),
        }
    }));
}
