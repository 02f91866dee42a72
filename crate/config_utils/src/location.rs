use std::{env, path::PathBuf};

use tracing::{debug, trace};

use crate::{config_bail, error::result::ConfigContext, ConfigError};

/// Environment variable naming an explicit configuration file
pub const DEVKIT_CONF_ENV: &str = "DEVKIT_CONF";

/// Configuration file relative to the user home folder
pub const DEFAULT_LOCAL_PATH: &str = ".config/devkit/devkit.toml";

/// System-wide configuration file
pub const DEFAULT_SYSTEM_PATH: &str = "/etc/devkit/devkit.toml";

/// Returns the path to the current user's home folder.
///
/// `HOME` is checked first, then the Windows variables (`USERPROFILE`, then
/// `HOMEDRIVE` + `HOMEPATH`).
///
/// Returns `None` if the home folder cannot be determined.
pub fn get_home_folder() -> Option<PathBuf> {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .or_else(|| {
            let hdrive = env::var_os("HOMEDRIVE")?;
            env::var_os("HOMEPATH").map(|hpath| {
                let mut path = PathBuf::from(hdrive);
                path.push(hpath);
                path.into_os_string()
            })
        })
        .map(PathBuf::from)
}

/// Returns `<home>/<default_local_path>`
pub fn get_default_conf_path(default_local_path: &str) -> Result<PathBuf, ConfigError> {
    get_home_folder()
        .context("unable to determine the home folder")
        .map(|home| home.join(default_local_path))
}

/// Find the configuration file to load.
///
/// Resolution order:
/// 1. `conf`, which must exist,
/// 2. the file named by `env_var_name`, which must exist,
/// 3. `<home>/<conf_default_local_path>` if it exists,
/// 4. `conf_default_system_path` if it exists.
///
/// Returns `Ok(None)` when neither default file exists: the caller then runs
/// on built-in defaults. No file is ever created.
pub fn location(
    conf: Option<PathBuf>,
    env_var_name: &str,
    conf_default_local_path: &str,
    conf_default_system_path: &str,
) -> Result<Option<PathBuf>, ConfigError> {
    trace!("Getting configuration file location");
    if let Some(conf_path) = conf {
        if !conf_path.exists() {
            return Err(ConfigError::NotFound(format!(
                "Configuration file {conf_path:?} does not exist"
            )));
        }
        return Ok(Some(conf_path));
    }
    if let Some(conf_path) = env::var_os(env_var_name).filter(|v| !v.is_empty()) {
        let conf_path = PathBuf::from(conf_path);
        if !conf_path.exists() {
            config_bail!(ConfigError::NotFound(format!(
                "Configuration file {conf_path:?} specified in {env_var_name} environment \
                 variable does not exist"
            )));
        }
        return Ok(Some(conf_path));
    }

    // no home folder is not an error: a CI runner may have none
    if let Ok(user_conf) = get_default_conf_path(conf_default_local_path) {
        trace!("User conf path is at: {user_conf:?}");
        if user_conf.exists() {
            return Ok(Some(user_conf));
        }
    }

    let system_conf = PathBuf::from(conf_default_system_path);
    if system_conf.exists() {
        debug!("No user configuration, using {conf_default_system_path}");
        return Ok(Some(system_conf));
    }

    debug!("No configuration file found, using defaults");
    Ok(None)
}
