use std::sync::atomic::{AtomicBool, Ordering};

use tracing::warn;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::LoggerError;

static LOG_INIT: AtomicBool = AtomicBool::new(false);

/// Install a stdout-only `tracing` subscriber for the crate's internal
/// diagnostics (no cloud backend).
///
/// # Arguments
/// * `rust_log` - filter directives; `RUST_LOG` is used when `None`, then
///   `info`
///
/// # Notes
/// - only the first call installs anything, later calls warn and return
/// - this function can be called from a `[tokio::test]` function
pub fn log_init(rust_log: Option<&str>) {
    if LOG_INIT.swap(true, Ordering::AcqRel) {
        warn!("log_init: already initialized");
        return;
    }
    if let Err(err) = log_init_(rust_log) {
        // another subscriber may already be installed: keep it
        eprintln!("Failed to initialize logging: {err}");
    }
}

fn log_init_(rust_log: Option<&str>) -> Result<(), LoggerError> {
    let filter = match rust_log {
        Some(directives) => EnvFilter::try_new(directives)?,
        None => EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?,
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_level(true).with_target(true).compact())
        .try_init()?;
    Ok(())
}
