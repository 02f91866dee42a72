use std::{
    collections::BTreeMap,
    env,
    ffi::OsString,
    path::{Path, PathBuf},
    process::Command,
};

use devkit_config::{VaultConfig, OP_PATH_ENV};
use tracing::{debug, trace};

use crate::{EnvError, EnvLog, EnvOutput};

#[cfg(windows)]
const OP_PROGRAM: &str = "op.exe";
#[cfg(not(windows))]
const OP_PROGRAM: &str = "op";

/// A located and working 1Password CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpCli {
    program: PathBuf,
    version: String,
}

impl OpCli {
    /// Locate `op` and check that `op --version` runs.
    pub fn load(vault: &VaultConfig) -> Result<Self, EnvError> {
        let program = locate(vault.op_path.as_deref(), env::var_os("PATH"))?;
        let output = Command::new(&program)
            .arg("--version")
            .output()
            .map_err(|e| EnvError::OpFailed(format!("{}: {e}", program.display())))?;
        if !output.status.success() {
            return Err(EnvError::OpFailed(format!(
                "{} --version exited with {}",
                program.display(),
                output.status
            )));
        }
        let version = String::from_utf8_lossy(&output.stdout).trim().to_owned();
        debug!("found op {version} at {}", program.display());
        Ok(Self { program, version })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Resolve the `op://` references of `template` into `output`.
    pub fn inject(&self, template: &Path, output: &Path) -> Result<(), EnvError> {
        trace!("op inject -i {template:?} -o {output:?}");
        let result = Command::new(&self.program)
            .arg("inject")
            .arg("-f")
            .arg("-i")
            .arg(template)
            .arg("-o")
            .arg(output)
            .output()?;
        if !result.status.success() {
            return Err(EnvError::Inject {
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_owned(),
            });
        }
        Ok(())
    }

    /// Load the project secrets into the process environment.
    ///
    /// - every variable of `skip_if_env_vars` already set (and the list not
    ///   empty): nothing is injected, their current values are returned
    /// - otherwise `<root>/<template_file>` is injected into
    ///   `<root>/<env_file>`, which is then parsed; variables already present
    ///   in the environment keep their value, all parsed pairs are returned
    pub fn init_env(
        &self,
        vault: &VaultConfig,
        project_root: &Path,
        skip_if_env_vars: &[&str],
        log: &dyn EnvLog,
    ) -> Result<EnvOutput, EnvError> {
        if let Some(parsed) = already_set(skip_if_env_vars) {
            log.info(&format!(
                "Skipping 1Password injection: {} already set",
                skip_if_env_vars.join(", ")
            ));
            return Ok(EnvOutput { parsed });
        }

        let template = project_root.join(&vault.template_file);
        if !template.is_file() {
            log.error(&format!("Template not found: {}", template.display()));
            return Err(EnvError::TemplateNotFound(template));
        }
        let env_file = project_root.join(&vault.env_file);

        if let Err(err) = self.inject(&template, &env_file) {
            log.error(&format!("1Password injection failed: {err}"));
            return Err(err);
        }

        let mut parsed = BTreeMap::new();
        for item in dotenvy::from_path_iter(&env_file)? {
            let (key, value) = item?;
            if env::var_os(&key).is_none() {
                env::set_var(&key, &value);
            }
            parsed.insert(key, value);
        }
        log.info(&format!(
            "Loaded {} variables from {}",
            parsed.len(),
            vault.env_file
        ));
        Ok(EnvOutput { parsed })
    }
}

/// The current values of `vars` when every one of them is set.
fn already_set(vars: &[&str]) -> Option<BTreeMap<String, String>> {
    if vars.is_empty() {
        return None;
    }
    vars.iter()
        .map(|name| env::var(name).ok().map(|value| ((*name).to_owned(), value)))
        .collect()
}

/// An explicit path must be a file; otherwise search `path_var`.
pub(crate) fn locate(
    op_path: Option<&Path>,
    path_var: Option<OsString>,
) -> Result<PathBuf, EnvError> {
    if let Some(op_path) = op_path {
        if op_path.is_file() {
            return Ok(op_path.to_path_buf());
        }
        return Err(EnvError::OpNotFound(format!(
            "{} (from [vault].op_path or {OP_PATH_ENV}) is not a file",
            op_path.display()
        )));
    }
    path_var
        .as_deref()
        .into_iter()
        .flat_map(env::split_paths)
        .map(|dir| dir.join(OP_PROGRAM))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| EnvError::OpNotFound(format!("`{OP_PROGRAM}` is not on PATH")))
}
