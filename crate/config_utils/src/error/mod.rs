use thiserror::Error;

pub(crate) mod result;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0}")]
    Default(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid URL: {0}")]
    Url(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<url::ParseError> for ConfigError {
    fn from(e: url::ParseError) -> Self {
        Self::Url(e.to_string())
    }
}

/// Construct a configuration error from a format string.
#[macro_export]
macro_rules! config_error {
    ($msg:literal) => {
        $crate::ConfigError::Default(::std::format!($msg))
    };
}

/// Return early with an error.
#[macro_export]
macro_rules! config_bail {
    ($msg:literal) => {
        return ::core::result::Result::Err($crate::config_error!($msg))
    };
    ($err:expr $(,)?) => {
        return ::core::result::Result::Err($err)
    };
}
