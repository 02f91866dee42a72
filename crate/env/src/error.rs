use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnvError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("op CLI not found: {0}")]
    OpNotFound(String),

    #[error("op CLI failed: {0}")]
    OpFailed(String),

    #[error("Template not found: {0:?}")]
    TemplateNotFound(PathBuf),

    #[error("op inject failed ({status}): {stderr}")]
    Inject { status: String, stderr: String },

    #[error("Invalid env file: {0}")]
    Dotenv(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<io::Error> for EnvError {
    fn from(e: io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<dotenvy::Error> for EnvError {
    fn from(e: dotenvy::Error) -> Self {
        Self::Dotenv(e.to_string())
    }
}

impl From<devkit_config::ConfigError> for EnvError {
    fn from(e: devkit_config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
