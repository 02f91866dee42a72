//! # devkit logger
//!
//! Named structured loggers (`debug`, `info`, `warn`, `error`, `child`,
//! `flush`) that prefer a cloud backend and fall back to the console.
//!
//! ## Features
//!
//! - `cloud`: records are exported to an OTLP collector through `tracing`
//!   and OpenTelemetry. The endpoint comes from `OTEL_EXPORTER_OTLP_ENDPOINT`
//!   or `[cloud_log].otlp_url` in `devkit.toml`.
//! - Without `cloud`, or without an endpoint, the backend is missing:
//!   - in CI (`CI` set) loggers are console stubs printing
//!     `{level} - [{name}] {message} {fields}`,
//!   - elsewhere [`create_logger`] prints how to enable the backend and exits
//!     with status 1.
//!
//! ```toml
//! [dependencies]
//! devkit_logger = { version = "0.1", features = ["cloud"] }
//! ```
mod backend;
#[cfg(feature = "cloud")]
mod cloud;
mod console;
mod error;
mod factory;
mod log_utils;
mod logger;
#[cfg(feature = "cloud")]
mod otlp;
mod stub;

pub use backend::{load_cloud_backend, LogBackend, StubBackend};
pub use console::{ConsoleSink, ConsoleStream, MemoryConsole, StdConsole};
pub use error::LoggerError;
pub use factory::{create_logger, factory, shutdown, LoggerFactory};
pub use log_utils::log_init;
pub use logger::{Fields, FlushFuture, Level, Logger};
pub use stub::StubLogger;

/// Re-exported dependencies used by the [`fields!`] macro
pub mod reexport {
    pub use serde_json;
}

#[cfg(test)]
pub mod tests;
