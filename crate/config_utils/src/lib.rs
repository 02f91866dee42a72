pub use config::{
    CloudLogConfig, DevkitConfig, VaultConfig, OP_PATH_ENV, OTLP_ENDPOINT_ENV, SERVICE_NAME_ENV,
};
pub use error::ConfigError;
pub use location::{
    get_default_conf_path, get_home_folder, location, DEFAULT_LOCAL_PATH, DEFAULT_SYSTEM_PATH,
    DEVKIT_CONF_ENV,
};

mod config;
mod error;
mod location;
