use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::{debug, trace};
use url::Url;

use crate::{
    config_bail,
    error::result::{ConfigContext, ConfigResult},
    location, ConfigError, DEFAULT_LOCAL_PATH, DEFAULT_SYSTEM_PATH, DEVKIT_CONF_ENV,
};

/// Overrides `cloud_log.otlp_url` (and enables cloud logging)
pub const OTLP_ENDPOINT_ENV: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";
/// Overrides `service_name`
pub const SERVICE_NAME_ENV: &str = "OTEL_SERVICE_NAME";
/// Overrides `vault.op_path`
pub const OP_PATH_ENV: &str = "DEVKIT_OP_PATH";

fn default_service_name() -> String {
    "devkit".to_owned()
}

const fn default_true() -> bool {
    true
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DevkitConfig {
    /// Reported to the OTLP collector as `service.name`
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Cloud logging backend. Absent means the backend is not configured.
    #[serde(default)]
    pub cloud_log: Option<CloudLogConfig>,

    #[serde(default)]
    pub vault: VaultConfig,
}

impl Default for DevkitConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            cloud_log: None,
            vault: VaultConfig::default(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CloudLogConfig {
    /// The OTLP collector URL
    /// (for instance, <http://localhost:4317>)
    pub otlp_url: String,

    /// The name of the environment
    /// (for instance, "production", "staging", "development")
    #[serde(default)]
    pub environment: Option<String>,

    /// The version of the service using this config
    #[serde(default)]
    pub version: Option<String>,

    /// Default `RUST_LOG` directives.
    /// The `RUST_LOG` environment variable is used when unset.
    #[serde(default)]
    pub rust_log: Option<String>,

    /// Also print events on stdout
    #[serde(default = "default_true")]
    pub log_to_stdout: bool,

    /// If set, events are also written to `<log_dir>/<service_name>.YYYY-MM-DD`
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl CloudLogConfig {
    #[must_use]
    pub fn new(otlp_url: impl Into<String>) -> Self {
        Self {
            otlp_url: otlp_url.into(),
            environment: None,
            version: None,
            rust_log: None,
            log_to_stdout: true,
            log_dir: None,
        }
    }
}

fn default_template_file() -> String {
    ".env.template".to_owned()
}

fn default_env_file() -> String {
    ".env".to_owned()
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Explicit path to the `op` binary; `PATH` is searched when unset
    #[serde(default)]
    pub op_path: Option<PathBuf>,

    /// Template holding `op://` references, relative to the project root
    #[serde(default = "default_template_file")]
    pub template_file: String,

    /// Injected output, relative to the project root
    #[serde(default = "default_env_file")]
    pub env_file: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            op_path: None,
            template_file: default_template_file(),
            env_file: default_env_file(),
        }
    }
}

impl DevkitConfig {
    /// Locate, load, override from the environment and validate the
    /// configuration.
    ///
    /// See [`location`] for the lookup order; built-in defaults are used when
    /// no file is found.
    pub fn resolve(conf: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config =
            match location(conf, DEVKIT_CONF_ENV, DEFAULT_LOCAL_PATH, DEFAULT_SYSTEM_PATH)? {
                Some(path) => Self::load(&path)?,
                None => Self::default(),
            };
        config.apply_env_overrides();
        config.validate()?;
        debug!("devkit configuration: {config:?}");
        Ok(config)
    }

    /// Read a configuration file; `.json` files are parsed as JSON, anything
    /// else as TOML.
    pub fn load(conf_path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(conf_path)
            .context(&format!("Unable to read configuration file {conf_path:?}"))?;
        trace!("Configuration file contents: {content}");
        let json = conf_path.extension().is_some_and(|ext| ext == "json");
        Self::parse(&content, json).map_err(|e| {
            ConfigError::Default(format!(
                "Error while parsing configuration file {conf_path:?}: {e}"
            ))
        })
    }

    fn parse(content: &str, json: bool) -> ConfigResult<Self> {
        if json {
            serde_json::from_str(content).context("invalid JSON")
        } else {
            toml::from_str(content).context("invalid TOML")
        }
    }

    /// Apply the `OTEL_*` and `DEVKIT_OP_PATH` environment variables on top of
    /// the file values.
    pub fn apply_env_overrides(&mut self) {
        if let Some(url) = non_empty_var(OTLP_ENDPOINT_ENV) {
            match &mut self.cloud_log {
                Some(cloud_log) => cloud_log.otlp_url = url,
                None => self.cloud_log = Some(CloudLogConfig::new(url)),
            }
        }
        if let Some(service_name) = non_empty_var(SERVICE_NAME_ENV) {
            self.service_name = service_name;
        }
        if let Some(op_path) = non_empty_var(OP_PATH_ENV) {
            self.vault.op_path = Some(PathBuf::from(op_path));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(cloud_log) = &self.cloud_log {
            Url::parse(&cloud_log.otlp_url)?;
        }
        for (field, file_name) in [
            ("template_file", &self.vault.template_file),
            ("env_file", &self.vault.env_file),
        ] {
            if file_name.is_empty() {
                config_bail!("vault.{field} must not be empty");
            }
        }
        Ok(())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}
