// Path: crates/test_utils/src/dispatch.rs
//! Cross-test failure signalling.
//!
//! Every fatal path of a [`TestContext`](crate::TestContext) dispatches
//! [`FAIL_EVENT`] before the failure is raised, so a listener registered
//! here runs while the failing test is still alive.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Event dispatched by every fatal path before the test is stopped.
pub const FAIL_EVENT: &str = "FAIL";

type Listener = Arc<dyn Fn() + Send + Sync>;

/// Maps an event name to a zero-argument callback.
///
/// Registration normally happens once at process start. Listeners are
/// never removed; registering the same name again replaces the previous one.
#[derive(Default)]
pub struct EventDispatcher {
    listeners: RwLock<HashMap<String, Listener>>,
}

static GLOBAL: Lazy<Arc<EventDispatcher>> = Lazy::new(|| Arc::new(EventDispatcher::new()));

/// The process-wide dispatcher used by contexts that were not given one.
pub fn global_dispatcher() -> Arc<EventDispatcher> {
    Arc::clone(&GLOBAL)
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&self, event: impl Into<String>, listener: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.listeners.write().insert(event.into(), Arc::new(listener));
    }

    pub fn is_registered(&self, event: &str) -> bool {
        self.listeners.read().contains_key(event)
    }

    /// Invokes the listener for `event`, if any. Returns whether one ran.
    ///
    /// The lock is released before the listener runs, so a listener may
    /// itself register or dispatch.
    pub fn dispatch(&self, event: &str) -> bool {
        let listener = self.listeners.read().get(event).cloned();
        match listener {
            Some(listener) => {
                listener();
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<String> = self.listeners.read().keys().cloned().collect();
        names.sort();
        f.debug_struct("EventDispatcher")
            .field("events", &names)
            .finish()
    }
}

/// A shared "some test has failed" flag wired to [`FAIL_EVENT`].
///
/// Long-running sibling tests poll it to abandon work once any test in the
/// process has hit a fatal failure.
#[derive(Clone, Debug, Default)]
pub struct FailFast {
    tripped: Arc<AtomicBool>,
}

impl FailFast {
    /// Registers a `FAIL` listener on `dispatcher` that trips the returned flag.
    pub fn install(dispatcher: &EventDispatcher) -> Self {
        let flag = Self::default();
        let tripped = Arc::clone(&flag.tripped);
        dispatcher.register(FAIL_EVENT, move || {
            tripped.store(true, Ordering::SeqCst);
        });
        flag
    }

    pub fn tripped(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.tripped.store(false, Ordering::SeqCst);
    }
}
