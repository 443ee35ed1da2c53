// Path: crates/telemetry/tests/init.rs
use pylons_telemetry::{init_tracing_with_filter, try_init_tracing};

#[test]
fn test_subscriber_installs_once() {
    assert!(try_init_tracing(), "first call should install the subscriber");
    assert!(!try_init_tracing(), "second call must be a no-op");

    // A second explicit install conflicts with the global default.
    assert!(init_tracing_with_filter("debug").is_err());

    tracing::info!(component = "telemetry-test", "subscriber is live");
}

#[test]
fn test_rejects_malformed_filter() {
    assert!(init_tracing_with_filter("pylons=verbose").is_err());
}
