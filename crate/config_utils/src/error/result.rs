use super::ConfigError;

pub(crate) type ConfigResult<R> = Result<R, ConfigError>;

/// Attach a description of the failed step to an error.
pub(crate) trait ConfigContext<T> {
    fn context(self, context: &str) -> ConfigResult<T>;
}

impl<T, E> ConfigContext<T> for Result<T, E>
where
    E: std::error::Error,
{
    fn context(self, context: &str) -> ConfigResult<T> {
        self.map_err(|e| ConfigError::Default(format!("{context}: {e}")))
    }
}

/// A missing value is reported as [`ConfigError::NotFound`].
impl<T> ConfigContext<T> for Option<T> {
    fn context(self, context: &str) -> ConfigResult<T> {
        self.ok_or_else(|| ConfigError::NotFound(context.to_owned()))
    }
}
