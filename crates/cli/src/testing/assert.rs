// Path: crates/cli/src/testing/assert.rs

use super::config::PollPolicy;
use super::exec::{CommandRunner, NodeCli};
use super::status::StatusSource;
use crate::error::CliError;
use std::thread::sleep;

// --- Block Polling ---

/// Blocks until the chain is at least `interval` blocks past the height
/// observed on entry, returning the height that satisfied the wait.
///
/// Polls `source` every `policy.interval`, at most
/// `policy.max_polls(interval)` times. Any status failure ends the wait
/// immediately with [`CliError::StatusUnavailable`]; running out of polls
/// yields [`CliError::WaitTimeout`]. An interval of zero returns at once.
pub fn wait_for_block_interval<S>(
    source: &S,
    interval: u64,
    policy: &PollPolicy,
) -> Result<u64, CliError>
where
    S: StatusSource + ?Sized,
{
    let start_height = current_height(source)?;
    if interval == 0 {
        return Ok(start_height);
    }
    let target = start_height.saturating_add(interval);
    let max_polls = policy.max_polls(interval);

    let mut last_height = start_height;
    for poll in 0..max_polls {
        last_height = current_height(source)?;
        if last_height >= target {
            log::debug!(
                "height {} reached after {} polls (wanted {})",
                last_height,
                poll + 1,
                target
            );
            return Ok(last_height);
        }
        log::trace!("height {} < {}, polling again", last_height, target);
        sleep(policy.interval);
    }

    Err(CliError::WaitTimeout {
        interval,
        start_height,
        last_height,
        polls: max_polls,
    })
}

/// Waits for one new block.
pub fn wait_for_next_block<S>(source: &S, policy: &PollPolicy) -> Result<u64, CliError>
where
    S: StatusSource + ?Sized,
{
    wait_for_block_interval(source, 1, policy)
}

fn current_height<S: StatusSource + ?Sized>(source: &S) -> Result<u64, CliError> {
    source
        .latest_block_height()
        .map_err(|e| CliError::StatusUnavailable(Box::new(e)))
}

impl<R: CommandRunner> NodeCli<R> {
    /// [`wait_for_block_interval`] against this node with its poll policy.
    pub fn wait_for_block_interval(&self, interval: u64) -> Result<u64, CliError> {
        wait_for_block_interval(self, interval, self.poll_policy())
    }

    pub fn wait_for_next_block(&self) -> Result<u64, CliError> {
        self.wait_for_block_interval(1)
    }

    /// Waits for the configured `max_wait_block` number of blocks.
    pub fn wait_for_max_wait_blocks(&self) -> Result<u64, CliError> {
        self.wait_for_block_interval(self.options().max_wait_block())
    }
}
