// Path: crates/telemetry/src/init.rs
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

static INSTALLED: OnceCell<()> = OnceCell::new();

/// Initializes the global `tracing` subscriber for structured JSON logging.
///
/// The filter is read from `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() -> Result<(), anyhow::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    install(filter)
}

/// Same as [`init_tracing`], but with an explicit filter directive such as
/// `"trace"` or `"pylons_cli=debug,info"`. `RUST_LOG` is ignored.
pub fn init_tracing_with_filter(directive: &str) -> Result<(), anyhow::Error> {
    let filter = EnvFilter::try_new(directive)?;
    install(filter)
}

/// Installs the default subscriber unless one is already in place.
///
/// Returns `true` if this call installed it. Safe to call from every test.
pub fn try_init_tracing() -> bool {
    if INSTALLED.get().is_some() {
        return false;
    }
    init_tracing().is_ok()
}

fn install(filter: EnvFilter) -> Result<(), anyhow::Error> {
    let fmt_layer = fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339());
    let subscriber = Registry::default().with(filter).with(fmt_layer);
    tracing_log::LogTracer::init()?;
    tracing::subscriber::set_global_default(subscriber)?;
    let _ = INSTALLED.set(());
    Ok(())
}
