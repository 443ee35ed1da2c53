// Path: crates/test_utils/src/lib.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! # Pylons Test Utilities
//!
//! A test context that wraps the native per-test handle with structured
//! fields, leveled logging and cross-test failure dispatch, for the
//! end-to-end tests that drive the `pylonsd` command line.
//!
//! ```no_run
//! use pylons_test_utils::{fields, TestContext};
//!
//! let t = TestContext::for_current_test();
//! t.run("create cookbook", |t| {
//!     let t = t.with_fields(fields! { "sender" => "alice" });
//!     t.debug("broadcasting");
//!     t.must_be_true(1 + 1 == 2);
//! });
//! ```

pub mod capture;
pub mod caller;
pub mod context;
pub mod dispatch;
pub mod fields;
pub mod handle;
pub mod level;

pub use capture::{CaptureHandle, FatalStop};
pub use caller::CallerFrame;
pub use context::{Backend, TestContext, LOG_TARGET};
pub use dispatch::{global_dispatcher, EventDispatcher, FailFast, FAIL_EVENT};
pub use fields::Fields;
pub use handle::{LibtestHandle, TestHandle};
pub use level::{LogLevel, ParseLogLevelError};
