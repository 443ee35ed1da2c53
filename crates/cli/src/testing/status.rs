// Path: crates/cli/src/testing/status.rs

use super::exec::{CommandRunner, NodeCli};
use crate::error::CliError;
use serde::{de, Deserialize, Deserializer};

/// The part of `pylonsd status` output the helpers rely on.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct NodeStatus {
    #[serde(rename = "SyncInfo", alias = "sync_info")]
    pub sync_info: SyncInfo,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct SyncInfo {
    #[serde(deserialize_with = "u64_from_str_or_int")]
    pub latest_block_height: u64,
    #[serde(default)]
    pub latest_block_hash: String,
    #[serde(default)]
    pub catching_up: bool,
}

/// Amino JSON writes 64-bit integers as strings; accept both forms.
pub(crate) fn u64_from_str_or_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(de::Error::custom),
    }
}

/// Decodes `bytes` as JSON, keeping the raw text on failure.
pub(crate) fn decode_json<T: de::DeserializeOwned>(what: &'static str, bytes: &[u8]) -> Result<T, CliError> {
    serde_json::from_slice(bytes).map_err(|source| CliError::Decode {
        what,
        payload: String::from_utf8_lossy(bytes).into_owned(),
        source,
    })
}

impl NodeStatus {
    pub fn from_json(bytes: &[u8]) -> Result<Self, CliError> {
        decode_json("node status", bytes)
    }

    pub fn latest_block_height(&self) -> u64 {
        self.sync_info.latest_block_height
    }
}

/// Anything that can report the node's current block height.
pub trait StatusSource {
    fn latest_block_height(&self) -> Result<u64, CliError>;
}

impl<F> StatusSource for F
where
    F: Fn() -> Result<u64, CliError>,
{
    fn latest_block_height(&self) -> Result<u64, CliError> {
        self()
    }
}

impl<R: CommandRunner> NodeCli<R> {
    /// Runs `pylonsd status` and decodes the result. The error keeps the
    /// call log or the undecodable payload.
    pub fn get_daemon_status(&self) -> Result<NodeStatus, CliError> {
        let output = self.invoke(&["status"], "")?;
        NodeStatus::from_json(&output.output)
    }
}

impl<R: CommandRunner> StatusSource for NodeCli<R> {
    fn latest_block_height(&self) -> Result<u64, CliError> {
        self.get_daemon_status().map(|status| status.latest_block_height())
    }
}
