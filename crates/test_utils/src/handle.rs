// Path: crates/test_utils/src/handle.rs
//! The native per-test handle wrapped by [`TestContext`](crate::TestContext).

use once_cell::sync::Lazy;
use parking_lot::{Condvar, Mutex};
use std::panic::{self, AssertUnwindSafe, Location};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// The capability set the wrapper consumes from a native test handle.
pub trait TestHandle: Sized {
    /// Full name of the test, sub-tests joined with `/`.
    fn name(&self) -> &str;

    /// Writes one line to the handle's log sink.
    fn log(&self, line: &str);

    /// Logs `message`, marks the test failed and stops it. Never returns.
    fn fatal(&self, message: &str) -> !;

    /// Marks the test as eligible to run alongside its parallel siblings.
    fn parallel(&self);

    /// Runs `body` as a named sub-test and reports whether it (and every
    /// sub-test it spawned) passed. A failing sub-test also fails `self`.
    fn run<F>(&self, name: &str, body: F) -> bool
    where
        F: FnOnce(Self);

    /// A throwaway handle not bound to any running test.
    fn detached() -> Self;

    /// Require-style failure: reports `failure` at the caller's location
    /// and stops the test.
    #[track_caller]
    fn fail_assertion(&self, failure: &str, message: &str) -> ! {
        let location = Location::caller();
        let mut report = format!(
            "\n\tError Trace:\t{}:{}\n\tError:      \t{}\n\tTest:       \t{}",
            location.file(),
            location.line(),
            failure,
            self.name()
        );
        if !message.is_empty() {
            report.push_str("\n\tMessages:   \t");
            report.push_str(message);
        }
        self.fatal(&report)
    }

    #[track_caller]
    fn require_true(&self, value: bool, message: &str) {
        if !value {
            self.fail_assertion("Should be true", message)
        }
    }
}

// --- Serial gate ---
// Root handles run one at a time until they opt into parallelism.

struct SerialGate {
    busy: Mutex<bool>,
    idle: Condvar,
}

static SERIAL: Lazy<SerialGate> = Lazy::new(|| SerialGate {
    busy: Mutex::new(false),
    idle: Condvar::new(),
});

impl SerialGate {
    fn acquire(&self) {
        let mut busy = self.busy.lock();
        while *busy {
            self.idle.wait(&mut busy);
        }
        *busy = true;
    }

    fn release(&self) {
        *self.busy.lock() = false;
        self.idle.notify_one();
    }
}

/// A [`TestHandle`] over Rust's built-in test harness.
///
/// Log lines go to stdout, which libtest captures per test. `fatal` panics,
/// which fails a root test outright and is caught at the sub-test boundary
/// by [`TestHandle::run`]. A root handle whose sub-tests failed panics when
/// dropped, so the enclosing `#[test]` is reported as failed.
///
/// Only one root handle should exist per test thread: roots wait on a
/// process-wide gate that [`TestHandle::parallel`] releases.
///
/// Sub-tests always run inline on the caller's thread and `run` returns
/// only once the body is done. Calling `parallel` on a sub-test handle just
/// records the mark, so siblings never overlap and a [`FailFast`] flag
/// stops later siblings rather than concurrent ones.
///
/// [`FailFast`]: crate::FailFast
#[derive(Debug)]
pub struct LibtestHandle {
    name: String,
    failed: Arc<AtomicBool>,
    is_root: bool,
    holds_serial: AtomicBool,
    parallel: AtomicBool,
}

impl LibtestHandle {
    /// Creates the root handle for the test called `name`, waiting until no
    /// other serial root test is running.
    pub fn new(name: impl Into<String>) -> Self {
        SERIAL.acquire();
        Self {
            name: name.into(),
            failed: Arc::new(AtomicBool::new(false)),
            is_root: true,
            holds_serial: AtomicBool::new(true),
            parallel: AtomicBool::new(false),
        }
    }

    /// Root handle named after the current libtest thread, which carries
    /// the test's path (e.g. `tests::test_send_coins`).
    pub fn current() -> Self {
        let name = std::thread::current()
            .name()
            .unwrap_or("unnamed")
            .to_string();
        Self::new(name)
    }

    fn child(&self, name: &str) -> Self {
        Self {
            name: format!("{}/{}", self.name, name.replace(' ', "_")),
            failed: Arc::new(AtomicBool::new(false)),
            is_root: false,
            holds_serial: AtomicBool::new(false),
            parallel: AtomicBool::new(false),
        }
    }

    pub fn failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel.load(Ordering::SeqCst)
    }
}

impl TestHandle for LibtestHandle {
    fn name(&self) -> &str {
        &self.name
    }

    fn log(&self, line: &str) {
        println!("    {}: {}", self.name, line);
    }

    #[allow(clippy::panic)]
    fn fatal(&self, message: &str) -> ! {
        self.failed.store(true, Ordering::SeqCst);
        panic!("{}: {}", self.name, message)
    }

    fn parallel(&self) {
        self.parallel.store(true, Ordering::SeqCst);
        if self.holds_serial.swap(false, Ordering::SeqCst) {
            SERIAL.release();
        }
    }

    fn run<F>(&self, name: &str, body: F) -> bool
    where
        F: FnOnce(Self),
    {
        let child = self.child(name);
        let child_name = child.name.clone();
        let child_failed = Arc::clone(&child.failed);
        let start = Instant::now();

        let outcome = panic::catch_unwind(AssertUnwindSafe(move || body(child)));
        let passed = outcome.is_ok() && !child_failed.load(Ordering::SeqCst);
        let elapsed = start.elapsed().as_secs_f64();

        if passed {
            println!("--- PASS: {} ({:.2}s)", child_name, elapsed);
        } else {
            self.failed.store(true, Ordering::SeqCst);
            println!("--- FAIL: {} ({:.2}s)", child_name, elapsed);
        }
        passed
    }

    fn detached() -> Self {
        Self {
            name: "standalone".to_string(),
            failed: Arc::new(AtomicBool::new(false)),
            is_root: false,
            holds_serial: AtomicBool::new(false),
            parallel: AtomicBool::new(false),
        }
    }
}

impl Drop for LibtestHandle {
    #[allow(clippy::panic)]
    fn drop(&mut self) {
        if self.holds_serial.swap(false, Ordering::SeqCst) {
            SERIAL.release();
        }
        if self.is_root && self.failed() && !std::thread::panicking() {
            panic!("--- FAIL: {} (one or more sub-tests failed)", self.name);
        }
    }
}
