use std::{collections::BTreeMap, fmt::Display, path::Path, sync::OnceLock};

use devkit_config::{DevkitConfig, VaultConfig};
use devkit_probe::{OrExit, ProbeContext, ProbeError, Prober, Requirement, Resolution};
use tracing::debug;

use crate::{ConsoleLog, EnvError, EnvLog, OpCli};

const OP_REMEDIATION: &str = concat!(
    "Install the 1Password CLI: https://developer.1password.com/docs/cli/get-started/\n",
    "then sign in with `op signin`, or point DEVKIT_OP_PATH ([vault].op_path) at the binary."
);

/// Process-wide probe of the `op` CLI
static VAULT: Prober<OpCli> = Prober::new("1Password CLI (op)", OP_REMEDIATION);

/// Process-wide holder behind [`init_env`]
static ENVIRONMENT: OnceLock<Environment> = OnceLock::new();

/// Variables loaded or injected by [`Environment::init_env`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOutput {
    pub parsed: BTreeMap<String, String>,
}

/// The resolved environment initializer: the `op` CLI when it was found, a
/// no-op stub in CI otherwise.
#[derive(Debug, Clone)]
pub struct Environment {
    vault: VaultConfig,
    op: Option<OpCli>,
}

impl Environment {
    /// Probe `prober` with `load`. Outside CI a missing CLI is an error: the
    /// no-op stub only exists in CI.
    pub fn resolve<F, E>(
        prober: &Prober<OpCli>,
        context: &ProbeContext,
        vault: VaultConfig,
        load: F,
    ) -> Result<Self, ProbeError>
    where
        F: FnOnce() -> Result<OpCli, E>,
        E: Display,
    {
        let op = match prober.resolve(context, Requirement::Required, load)? {
            Resolution::Real(op) => Some(op.clone()),
            Resolution::Degraded => None,
        };
        Ok(Self { vault, op })
    }

    /// Resolve against the process-wide `op` probe.
    pub fn from_config(config: &DevkitConfig, context: &ProbeContext) -> Result<Self, ProbeError> {
        Self::resolve(&VAULT, context, config.vault.clone(), || {
            OpCli::load(&config.vault)
        })
    }

    /// The CI no-op initializer
    pub fn stub(vault: VaultConfig) -> Self {
        Self { vault, op: None }
    }

    pub const fn is_degraded(&self) -> bool {
        self.op.is_none()
    }

    pub const fn op(&self) -> Option<&OpCli> {
        self.op.as_ref()
    }

    /// Load the secrets of `project_root` into the process environment.
    ///
    /// `log` defaults to the console. With the stub this returns an empty
    /// result and logs nothing.
    ///
    /// # Errors
    /// Failures of the `op` CLI or of the env file are returned as is, never
    /// retried.
    pub fn init_env(
        &self,
        project_root: &Path,
        skip_if_env_vars: &[&str],
        log: Option<&dyn EnvLog>,
    ) -> Result<EnvOutput, EnvError> {
        let Some(op) = &self.op else {
            debug!("op CLI not available, skipping secret injection");
            return Ok(EnvOutput::default());
        };
        op.init_env(
            &self.vault,
            project_root,
            skip_if_env_vars,
            log.unwrap_or(&ConsoleLog),
        )
    }
}

/// Initialize the environment with the process-wide initializer.
///
/// The initializer is resolved on first call from the devkit configuration
/// and the `CI` flag; outside CI a missing `op` CLI prints a remediation
/// message and exits the process with status 1.
pub fn init_env(
    project_root: impl AsRef<Path>,
    skip_if_env_vars: &[&str],
    log: Option<&dyn EnvLog>,
) -> Result<EnvOutput, EnvError> {
    let environment = match ENVIRONMENT.get() {
        Some(environment) => environment,
        None => {
            let config = DevkitConfig::resolve(None)?;
            ENVIRONMENT.get_or_init(|| {
                Environment::from_config(&config, &ProbeContext::detect()).or_exit()
            })
        }
    };
    environment.init_env(project_root.as_ref(), skip_if_env_vars, log)
}
