// Path: crates/test_utils/src/context.rs
//! The test context wrapper.
//!
//! A [`TestContext`] decorates a native [`TestHandle`] with a structured
//! field set, a severity threshold and a backend chosen once at
//! construction:
//!
//! - [`Backend::Native`] writes through the handle's own log sink and stops
//!   the test with the handle's fatal mechanism.
//! - [`Backend::Standalone`] is used when no test is running (a scenario
//!   driven from a binary). Records go to the global `tracing` subscriber and
//!   a fatal failure exits the process.

use crate::caller::CallerFrame;
use crate::dispatch::{global_dispatcher, EventDispatcher, FailFast, FAIL_EVENT};
use crate::fields::Fields;
use crate::handle::{LibtestHandle, TestHandle};
use crate::level::LogLevel;
use std::fmt;
use std::sync::Arc;

/// `tracing` target for records emitted by standalone contexts.
pub const LOG_TARGET: &str = "pylons::evtesting";

/// Where a context sends its records. Fixed for the context's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Native,
    Standalone,
}

pub struct TestContext<H: TestHandle = LibtestHandle> {
    origin: Arc<H>,
    fields: Fields,
    log_level: LogLevel,
    backend: Backend,
    dispatcher: Arc<EventDispatcher>,
}

impl<H: TestHandle> Clone for TestContext<H> {
    fn clone(&self) -> Self {
        Self {
            origin: Arc::clone(&self.origin),
            fields: self.fields.clone(),
            log_level: self.log_level,
            backend: self.backend,
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }
}

impl<H: TestHandle> fmt::Debug for TestContext<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestContext")
            .field("test", &self.origin.name())
            .field("fields", &self.fields)
            .field("log_level", &self.log_level)
            .field("backend", &self.backend)
            .finish()
    }
}

impl TestContext<LibtestHandle> {
    /// Wraps a root handle for the libtest test running on this thread.
    pub fn for_current_test() -> Self {
        Self::new(Some(LibtestHandle::current()))
    }
}

impl<H: TestHandle> TestContext<H> {
    /// Wraps `origin`, or builds a standalone context when it is `None`.
    ///
    /// A wrapped handle logs at [`LogLevel::Debug`]. A standalone context
    /// owns a detached handle and logs everything down to
    /// [`LogLevel::Trace`] through `tracing`.
    pub fn new(origin: Option<H>) -> Self {
        match origin {
            Some(handle) => Self {
                origin: Arc::new(handle),
                fields: Fields::new(),
                log_level: LogLevel::Debug,
                backend: Backend::Native,
                dispatcher: global_dispatcher(),
            },
            None => Self {
                origin: Arc::new(H::detached()),
                fields: Fields::new(),
                log_level: LogLevel::Trace,
                backend: Backend::Standalone,
                dispatcher: global_dispatcher(),
            },
        }
    }

    pub fn standalone() -> Self {
        Self::new(None)
    }

    /// Replaces the process-wide dispatcher with `dispatcher`, for tests
    /// that need an isolated listener table.
    pub fn with_dispatcher(mut self, dispatcher: Arc<EventDispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Derives a context carrying the receiver's fields merged with
    /// `fields`. The receiver is left untouched and keeps sharing the same
    /// handle, backend and level with the result.
    ///
    /// Fields accumulate: a helper handed a tagged context logs the
    /// caller's fields along with its own, and on a key collision the
    /// value in `fields` wins. Start from a fresh context to drop them.
    pub fn with_fields(&self, fields: Fields) -> Self {
        Self {
            origin: Arc::clone(&self.origin),
            fields: self.fields.merged(&fields),
            log_level: self.log_level,
            backend: self.backend,
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }

    /// Runs `body` as a sub-test. The sub-test's context inherits this
    /// context's fields, backend and level, bound to the sub-test's handle.
    pub fn run<F>(&self, name: &str, body: F) -> bool
    where
        F: FnOnce(&TestContext<H>),
    {
        let fields = self.fields.clone();
        let log_level = self.log_level;
        let backend = self.backend;
        let dispatcher = Arc::clone(&self.dispatcher);
        self.origin.run(name, move |sub| {
            let ctx = TestContext {
                origin: Arc::new(sub),
                fields,
                log_level,
                backend,
                dispatcher,
            };
            body(&ctx);
        })
    }

    pub fn dispatch_event(&self, event: &str) {
        self.dispatcher.dispatch(event);
    }

    pub fn parallel(&self) {
        self.origin.parallel();
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn is_standalone(&self) -> bool {
        self.backend == Backend::Standalone
    }

    pub fn origin(&self) -> &H {
        &self.origin
    }

    /// The field set rendered as ` key=value` pairs in insertion order.
    pub fn format_fields(&self) -> String {
        self.fields.render()
    }

    // --- Logging ---

    /// Baseline log line. Never filtered and never carries a call site.
    pub fn log(&self, message: impl fmt::Display) {
        self.emit(LogLevel::Info, &message);
    }

    pub fn info(&self, message: impl fmt::Display) {
        if !LogLevel::Info.enabled_at(self.log_level) {
            return;
        }
        self.emit(LogLevel::Info, &message);
    }

    #[track_caller]
    pub fn warn(&self, message: impl fmt::Display) {
        if !LogLevel::Warn.enabled_at(self.log_level) {
            return;
        }
        self.print_caller_line();
        self.emit(LogLevel::Warn, &message);
    }

    /// Non-fatal error record. The test keeps running.
    #[track_caller]
    pub fn error(&self, message: impl fmt::Display) {
        if !LogLevel::Error.enabled_at(self.log_level) {
            return;
        }
        self.print_caller_line();
        self.emit(LogLevel::Error, &message);
    }

    #[track_caller]
    pub fn debug(&self, message: impl fmt::Display) {
        if !LogLevel::Debug.enabled_at(self.log_level) {
            return;
        }
        self.print_caller_line();
        self.emit(LogLevel::Debug, &message);
    }

    #[track_caller]
    pub fn trace(&self, message: impl fmt::Display) {
        if !LogLevel::Trace.enabled_at(self.log_level) {
            return;
        }
        self.print_caller_line();
        self.emit(LogLevel::Trace, &message);
    }

    // --- Fatal paths ---

    /// Dispatches `FAIL`, logs `message` with the call site and stops the
    /// test (or the process, when standalone).
    #[track_caller]
    pub fn fatal(&self, message: impl fmt::Display) -> ! {
        self.dispatch_event(FAIL_EVENT);
        self.print_caller_line();
        self.raise(&message)
    }

    /// `fatal` over preformatted arguments: `t.fatalf(format_args!(..))`.
    #[track_caller]
    pub fn fatalf(&self, args: fmt::Arguments<'_>) -> ! {
        self.dispatch_event(FAIL_EVENT);
        self.print_caller_line();
        self.raise(&args)
    }

    #[track_caller]
    pub fn must_be_true(&self, value: bool) {
        if value {
            return;
        }
        self.dispatch_event(FAIL_EVENT);
        match self.backend {
            Backend::Standalone => {
                self.print_caller_line();
                self.raise(&"must_be_true validation failure")
            }
            Backend::Native => self.origin.require_true(value, &self.fields.render()),
        }
    }

    /// Unwraps `result`, failing the test on `Err`.
    #[track_caller]
    pub fn must_be_ok<T, E: fmt::Display>(&self, result: Result<T, E>) -> T {
        match result {
            Ok(value) => value,
            Err(err) => self.validation_failure(&err, "must_be_ok"),
        }
    }

    /// Fails the test if `err` holds an error.
    #[track_caller]
    pub fn must_be_none<E: fmt::Display>(&self, err: Option<E>) {
        if let Some(err) = err {
            self.validation_failure(&err, "must_be_none")
        }
    }

    /// Stops this test if another test has already failed.
    #[track_caller]
    pub fn abort_if_tripped(&self, flag: &FailFast) {
        if flag.tripped() {
            self.print_caller_line();
            self.raise(&"aborted: another test reported a failure")
        }
    }

    #[track_caller]
    fn validation_failure(&self, err: &dyn fmt::Display, check: &str) -> ! {
        self.dispatch_event(FAIL_EVENT);
        match self.backend {
            Backend::Standalone => {
                self.print_caller_line();
                let ctx = self.with_fields(Fields::new().with_display("error", err));
                ctx.raise(&format_args!("{} validation failure", check))
            }
            Backend::Native => self.origin.fail_assertion(
                &format!("Received unexpected error:\n\t\t{}", err),
                &self.fields.render(),
            ),
        }
    }

    // --- Emission ---

    #[track_caller]
    fn print_caller_line(&self) {
        let frame = CallerFrame::capture();
        match self.backend {
            Backend::Native => {
                let location = Fields::new()
                    .with("file_line", &frame.file_line())
                    .with("func", &frame.function);
                self.origin.log(&location.render());
            }
            Backend::Standalone => {
                tracing::trace!(
                    target: LOG_TARGET,
                    file_line = %frame.file_line(),
                    func = %frame.function,
                    "{}",
                    frame
                );
            }
        }
    }

    fn emit(&self, level: LogLevel, message: &dyn fmt::Display) {
        match self.backend {
            Backend::Native => {
                self.origin.log(&self.fields.render());
                self.origin.log(&message.to_string());
            }
            Backend::Standalone => standalone_event(level, &self.fields, message),
        }
    }

    fn raise(&self, message: &dyn fmt::Display) -> ! {
        match self.backend {
            Backend::Native => {
                self.origin.log(&self.fields.render());
                self.origin.fatal(&message.to_string())
            }
            Backend::Standalone => {
                standalone_event(LogLevel::Fatal, &self.fields, message);
                std::process::exit(1)
            }
        }
    }
}

fn standalone_event(level: LogLevel, fields: &Fields, message: &dyn fmt::Display) {
    let fields = fields.to_json();
    match level {
        LogLevel::Trace => tracing::trace!(target: LOG_TARGET, %fields, "{}", message),
        LogLevel::Debug => tracing::debug!(target: LOG_TARGET, %fields, "{}", message),
        LogLevel::Info => tracing::info!(target: LOG_TARGET, %fields, "{}", message),
        LogLevel::Warn => tracing::warn!(target: LOG_TARGET, %fields, "{}", message),
        LogLevel::Error => tracing::error!(target: LOG_TARGET, %fields, "{}", message),
        LogLevel::Fatal => tracing::error!(target: LOG_TARGET, fatal = true, %fields, "{}", message),
    }
}
