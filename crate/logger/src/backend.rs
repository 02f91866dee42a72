use std::sync::Arc;

use devkit_config::DevkitConfig;

use crate::{
    console::ConsoleSink, logger::ready, stub::StubLogger, FlushFuture, Logger, LoggerError,
};

/// Creates loggers for one logging destination.
pub trait LogBackend: Send + Sync {
    fn create_logger(&self, name: &str) -> Box<dyn Logger>;

    /// Flush everything buffered by the backend.
    fn flush(&self) -> FlushFuture {
        ready(Ok(()))
    }

    /// Flush and release the backend. Loggers created afterwards may drop
    /// their records.
    fn shutdown(&self) -> Result<(), LoggerError> {
        Ok(())
    }
}

/// Hands out [`StubLogger`]s writing to one console.
pub struct StubBackend {
    console: Arc<dyn ConsoleSink>,
}

impl StubBackend {
    pub fn new(console: Arc<dyn ConsoleSink>) -> Self {
        Self { console }
    }
}

impl LogBackend for StubBackend {
    fn create_logger(&self, name: &str) -> Box<dyn Logger> {
        Box::new(StubLogger::new(name, Arc::clone(&self.console)))
    }
}

/// Build and install the OTLP backend described by `config.cloud_log`.
///
/// Fails when the crate was built without the `cloud` feature, when no
/// endpoint is configured, or when the exporter or the global subscriber
/// cannot be set up.
///
/// The caller does not need a tokio runtime: the exporter runs on its own.
#[cfg(feature = "cloud")]
pub fn load_cloud_backend(config: &DevkitConfig) -> Result<Arc<dyn LogBackend>, LoggerError> {
    let cloud_log = config.cloud_log.as_ref().ok_or_else(|| {
        LoggerError::NotConfigured(format!(
            "no OTLP endpoint, set {} or [cloud_log].otlp_url",
            devkit_config::OTLP_ENDPOINT_ENV
        ))
    })?;
    let backend = crate::cloud::CloudBackend::install(&config.service_name, cloud_log)?;
    Ok(Arc::new(backend))
}

#[cfg(not(feature = "cloud"))]
pub fn load_cloud_backend(_config: &DevkitConfig) -> Result<Arc<dyn LogBackend>, LoggerError> {
    Err(LoggerError::NotCompiled(
        "devkit_logger was built without the `cloud` feature".to_owned(),
    ))
}
