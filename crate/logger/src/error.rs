use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not compiled in: {0}")]
    NotCompiled(String),

    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("OTLP error: {0}")]
    Otlp(String),

    #[error("Parsing error: {0}")]
    Parsing(String),

    #[error("Tracing subscriber error: {0}")]
    TracingSubscriber(String),

    #[error("IO error: {0}")]
    IOError(String),
}

impl From<devkit_config::ConfigError> for LoggerError {
    fn from(e: devkit_config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

#[cfg(feature = "cloud")]
impl From<opentelemetry_otlp::ExporterBuildError> for LoggerError {
    fn from(e: opentelemetry_otlp::ExporterBuildError) -> Self {
        Self::Otlp(e.to_string())
    }
}

#[cfg(feature = "cloud")]
impl From<opentelemetry_sdk::error::OTelSdkError> for LoggerError {
    fn from(e: opentelemetry_sdk::error::OTelSdkError) -> Self {
        Self::Otlp(e.to_string())
    }
}

impl From<tracing_subscriber::filter::ParseError> for LoggerError {
    fn from(e: tracing_subscriber::filter::ParseError) -> Self {
        Self::Parsing(e.to_string())
    }
}

impl From<tracing_subscriber::util::TryInitError> for LoggerError {
    fn from(value: tracing_subscriber::util::TryInitError) -> Self {
        Self::TracingSubscriber(value.to_string())
    }
}
