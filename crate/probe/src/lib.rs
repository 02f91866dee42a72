//! # devkit probe
//!
//! Load an optional dependency once per process, cache whether it is there,
//! and decide what to do when it is not:
//!
//! | context | dependency | outcome                              |
//! |---------|------------|--------------------------------------|
//! | any     | present    | use it                               |
//! | CI      | absent     | stub, one notice on stdout           |
//! | local   | absent     | exit with status 1 and a remediation |
//!
//! The `CI` environment variable is read once and cached.
mod context;
mod error;
mod prober;

pub use context::{ProbeContext, RunContext, CI_ENV};
pub use error::{OrExit, ProbeError, MISSING_DEPENDENCY_EXIT_CODE};
pub use prober::{Availability, Prober, Requirement, Resolution};
