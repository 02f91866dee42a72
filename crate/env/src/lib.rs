//! # devkit env
//!
//! Load project secrets with the 1Password CLI (`op`): the `op://`
//! references of `.env.template` are injected into `.env`, which is then
//! loaded into the process environment.
//!
//! Where `op` is missing:
//! - in CI (`CI` set) [`init_env`] is a no-op returning an empty result,
//! - elsewhere the first call prints how to install `op` and exits with
//!   status 1.
//!
//! ```ignore
//! let log = devkit_logger::create_logger("billing");
//! let env = devkit_env::init_env(".", &["DATABASE_URL"], Some(&log))?;
//! ```
mod environment;
mod error;
mod log;
mod op;

pub use environment::{init_env, EnvOutput, Environment};
pub use error::EnvError;
pub use log::{ConsoleLog, EnvLog};
pub use op::OpCli;
