// Path: crates/test_utils/src/capture.rs
//! A recording [`TestHandle`] for asserting what a context emitted.

use crate::handle::TestHandle;
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Panic payload raised by [`CaptureHandle::fatal`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FatalStop {
    pub test: String,
    pub message: String,
}

#[derive(Debug, Default)]
struct Journal {
    lines: Mutex<Vec<(String, String)>>,
    fatals: Mutex<Vec<FatalStop>>,
    parallel_calls: AtomicUsize,
}

/// Records every log line, fatal stop and parallel mark instead of printing.
///
/// Sub-tests share their parent's journal; each record is tagged with the
/// full name of the test that produced it.
#[derive(Clone, Debug)]
pub struct CaptureHandle {
    name: String,
    journal: Arc<Journal>,
}

impl CaptureHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            journal: Arc::new(Journal::default()),
        }
    }

    /// Every logged line, in order, across this handle and its sub-tests.
    pub fn lines(&self) -> Vec<String> {
        self.journal
            .lines
            .lock()
            .iter()
            .map(|(_, line)| line.clone())
            .collect()
    }

    /// Lines logged by the test called `test` only.
    pub fn lines_for(&self, test: &str) -> Vec<String> {
        self.journal
            .lines
            .lock()
            .iter()
            .filter(|(name, _)| name == test)
            .map(|(_, line)| line.clone())
            .collect()
    }

    pub fn fatals(&self) -> Vec<FatalStop> {
        self.journal.fatals.lock().clone()
    }

    pub fn parallel_calls(&self) -> usize {
        self.journal.parallel_calls.load(Ordering::SeqCst)
    }

    /// Runs `f`, returning the [`FatalStop`] it raised, if any. Panics that
    /// are not fatal stops are resumed.
    pub fn catch_fatal<F: FnOnce()>(f: F) -> Option<FatalStop> {
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(()) => None,
            Err(payload) => match payload.downcast::<FatalStop>() {
                Ok(stop) => Some(*stop),
                Err(other) => panic::resume_unwind(other),
            },
        }
    }
}

impl TestHandle for CaptureHandle {
    fn name(&self) -> &str {
        &self.name
    }

    fn log(&self, line: &str) {
        self.journal
            .lines
            .lock()
            .push((self.name.clone(), line.to_string()));
    }

    fn fatal(&self, message: &str) -> ! {
        let stop = FatalStop {
            test: self.name.clone(),
            message: message.to_string(),
        };
        self.journal.fatals.lock().push(stop.clone());
        panic::panic_any(stop)
    }

    fn parallel(&self) {
        self.journal.parallel_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn run<F>(&self, name: &str, body: F) -> bool
    where
        F: FnOnce(Self),
    {
        let child = Self {
            name: format!("{}/{}", self.name, name),
            journal: Arc::clone(&self.journal),
        };
        let child_name = child.name.clone();
        let before = self.journal.fatals.lock().len();
        let outcome = panic::catch_unwind(AssertUnwindSafe(move || body(child)));
        let nested_prefix = format!("{}/", child_name);
        let nested_fatal = self
            .journal
            .fatals
            .lock()
            .iter()
            .skip(before)
            .any(|stop| stop.test == child_name || stop.test.starts_with(&nested_prefix));
        outcome.is_ok() && !nested_fatal
    }

    fn detached() -> Self {
        Self::new("standalone")
    }
}
