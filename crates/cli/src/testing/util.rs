// Path: crates/cli/src/testing/util.rs

use crate::error::CliError;
use once_cell::sync::Lazy;
use pylons_test_utils::{Fields, TestContext, TestHandle};
use regex::Regex;
use serde::Serialize;
use std::fmt::Debug;
use std::fs;
use std::path::Path;

#[allow(clippy::expect_used)]
static TX_HASH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""txhash":\s*"([^"]*)""#).expect("txhash pattern is valid"));

/// Pulls the value of the first `"txhash": "<hash>"` pair out of command
/// output. Returns an empty string when there is none.
pub fn extract_tx_hash(output: &str) -> String {
    TX_HASH_RE
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Renders `value` as compact JSON, or as `Debug` plus the serializer error.
pub fn json_formatter<T: Serialize + Debug + ?Sized>(value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => format!("{:?};jsonMarshalErr={}", value, e),
    }
}

/// Reads a fixture file, failing the test if it cannot be read.
#[track_caller]
pub fn read_file<H: TestHandle>(path: impl AsRef<Path>, t: &TestContext<H>) -> Vec<u8> {
    let path = path.as_ref();
    let result = fs::read(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    });
    t.with_fields(Fields::new().with_display("file_path", path.display()))
        .must_be_ok(result)
}

/// Removes a scratch file. A failure is logged, not fatal.
#[track_caller]
pub fn clean_file<H: TestHandle>(path: impl AsRef<Path>, t: &TestContext<H>) {
    let path = path.as_ref();
    if let Err(e) = fs::remove_file(path) {
        t.with_fields(
            Fields::new()
                .with_display("error", &e)
                .with_display("file_path", path.display()),
        )
        .error("error removing file");
    }
}
