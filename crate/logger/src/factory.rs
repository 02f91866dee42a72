use std::{
    fmt::Display,
    sync::{Arc, OnceLock},
};

use devkit_config::DevkitConfig;
use devkit_probe::{OrExit, ProbeContext, ProbeError, Prober, Requirement, Resolution};

use crate::{
    backend::{load_cloud_backend, LogBackend, StubBackend},
    console::{ConsoleSink, StdConsole},
    FlushFuture, Logger, LoggerError,
};

const CLOUD_LOG_REMEDIATION: &str = concat!(
    "Enable the `cloud` feature:\n",
    "  devkit_logger = { version = \"0.1\", features = [\"cloud\"] }\n",
    "then set OTEL_EXPORTER_OTLP_ENDPOINT (or [cloud_log].otlp_url in devkit.toml) and rebuild."
);

/// Process-wide probe of the cloud logging backend
static CLOUD_LOG: Prober<Arc<dyn LogBackend>> =
    Prober::new("cloud logging backend", CLOUD_LOG_REMEDIATION);

/// Process-wide factory behind [`create_logger`]
static FACTORY: OnceLock<LoggerFactory> = OnceLock::new();

/// Hands out loggers from the resolved backend: the cloud backend when it
/// loaded, console stubs otherwise.
///
/// Build one at startup and pass it by reference; [`create_logger`] is the
/// process-wide shortcut.
#[derive(Clone)]
pub struct LoggerFactory {
    backend: Arc<dyn LogBackend>,
    degraded: bool,
}

impl LoggerFactory {
    /// A factory over the console stub only
    pub fn stub(console: Arc<dyn ConsoleSink>) -> Self {
        Self {
            backend: Arc::new(StubBackend::new(console)),
            degraded: true,
        }
    }

    pub fn with_backend(backend: Arc<dyn LogBackend>) -> Self {
        Self {
            backend,
            degraded: false,
        }
    }

    /// Probe `prober` with `load` and apply the fallback policy.
    ///
    /// # Errors
    /// [`ProbeError::Missing`] when the backend is required, absent, and the
    /// process does not run in CI.
    pub fn resolve<F, E>(
        prober: &Prober<Arc<dyn LogBackend>>,
        context: &ProbeContext,
        requirement: Requirement,
        console: Arc<dyn ConsoleSink>,
        load: F,
    ) -> Result<Self, ProbeError>
    where
        F: FnOnce() -> Result<Arc<dyn LogBackend>, E>,
        E: Display,
    {
        Ok(match prober.resolve(context, requirement, load)? {
            Resolution::Real(backend) => Self::with_backend(Arc::clone(backend)),
            Resolution::Degraded => Self::stub(console),
        })
    }

    /// Resolve against the process-wide cloud backend probe, using `config`.
    ///
    /// The probe runs once per process: the first configuration wins.
    pub fn from_config(config: &DevkitConfig, context: &ProbeContext) -> Result<Self, ProbeError> {
        Self::resolve(
            &CLOUD_LOG,
            context,
            Requirement::Required,
            Arc::new(StdConsole),
            || load_cloud_backend(config),
        )
    }

    /// Resolve like [`Self::from_config`] but never fail: a missing backend
    /// degrades to the console in every context.
    pub fn lazy(config: &DevkitConfig, context: &ProbeContext) -> Self {
        match Self::resolve(
            &CLOUD_LOG,
            context,
            Requirement::Optional,
            Arc::new(StdConsole),
            || load_cloud_backend(config),
        ) {
            Ok(factory) => factory,
            Err(_) => Self::stub(Arc::new(StdConsole)),
        }
    }

    pub fn create_logger(&self, name: &str) -> Box<dyn Logger> {
        self.backend.create_logger(name)
    }

    /// True when loggers are console stubs
    pub const fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn flush(&self) -> FlushFuture {
        self.backend.flush()
    }

    pub fn shutdown(&self) -> Result<(), LoggerError> {
        self.backend.shutdown()
    }
}

/// The process-wide factory, resolved on first use from the devkit
/// configuration and the `CI` flag.
///
/// Outside CI a missing cloud backend prints a remediation message and exits
/// the process with status 1.
pub fn factory() -> &'static LoggerFactory {
    FACTORY.get_or_init(|| {
        let context = ProbeContext::detect();
        LoggerFactory::resolve(
            &CLOUD_LOG,
            &context,
            Requirement::Required,
            Arc::new(StdConsole),
            || -> Result<Arc<dyn LogBackend>, LoggerError> {
                let config = DevkitConfig::resolve(None)?;
                load_cloud_backend(&config)
            },
        )
        .or_exit()
    })
}

/// Create a logger from the process-wide factory.
///
/// See [`factory`] for the behavior when the cloud backend is missing.
pub fn create_logger(name: &str) -> Box<dyn Logger> {
    factory().create_logger(name)
}

/// Flush pending records and release the process-wide backend, for test
/// teardown and clean exits. A no-op when no logger was ever created.
pub async fn shutdown() -> Result<(), LoggerError> {
    let Some(factory) = FACTORY.get() else {
        return Ok(());
    };
    factory.flush().await?;
    factory.shutdown()
}
