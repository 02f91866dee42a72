use std::{
    env::set_var,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, PoisonError,
    },
};

use devkit_config::CloudLogConfig;
use opentelemetry::{global, trace::TracerProvider};
use opentelemetry_sdk::trace::SdkTracerProvider;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Layer};

use crate::{
    backend::LogBackend,
    logger::{merge_fields, render_fields},
    otlp, Fields, FlushFuture, Level, Logger, LoggerError,
};

/// One short span per record so the OpenTelemetry layer exports it.
macro_rules! emit {
    ($span:ident, $event:ident, $logger:expr, $fields:expr, $message:expr) => {{
        let span = tracing::$span!("log", logger = %$logger);
        let _guard = span.enter();
        tracing::$event!(fields = %$fields, "{}", $message);
    }};
}

/// Records go to the OTLP collector through the global `tracing` subscriber.
pub(crate) struct CloudBackend {
    tracer_provider: SdkTracerProvider,
    rolling_appender_guard: Mutex<Option<WorkerGuard>>,
    /// Runs the tonic connection tasks of the exporter, whatever runtime (if
    /// any) the caller is on
    exporter_runtime: Mutex<Option<Runtime>>,
    shut_down: AtomicBool,
}

impl CloudBackend {
    /// Build the tracer provider and install the global subscriber: an env
    /// filter, the optional stdout and rolling-file layers, and the
    /// OpenTelemetry layer.
    pub(crate) fn install(
        service_name: &str,
        config: &CloudLogConfig,
    ) -> Result<Self, LoggerError> {
        let exporter_runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("devkit-otlp")
            .enable_all()
            .build()
            .map_err(|e| {
                LoggerError::IOError(format!("Failed to start the OTLP runtime: {e}"))
            })?;

        let installed = {
            let _enter = exporter_runtime.enter();
            install_subscriber(service_name, config)
        };
        match installed {
            Ok((tracer_provider, rolling_appender_guard)) => Ok(Self {
                tracer_provider,
                rolling_appender_guard: Mutex::new(rolling_appender_guard),
                exporter_runtime: Mutex::new(Some(exporter_runtime)),
                shut_down: AtomicBool::new(false),
            }),
            Err(err) => {
                exporter_runtime.shutdown_background();
                Err(err)
            }
        }
    }
}

/// Must run inside the exporter runtime: the tonic channel spawns its tasks
/// on the current one.
fn install_subscriber(
    service_name: &str,
    config: &CloudLogConfig,
) -> Result<(SdkTracerProvider, Option<WorkerGuard>), LoggerError> {
    if let Some(rust_log) = &config.rust_log {
        set_var("RUST_LOG", rust_log);
    }

    let tracer_provider = otlp::init_tracer_provider(service_name, config)?;
    let mut rolling_appender_guard = None;
    let mut layers = vec![];

    // Keep the exporter's own transport out of the exported records
    let (filter, _reload_handle) = reload::Layer::new(
        EnvFilter::from_default_env()
            .add_directive("hyper=error".parse()?)
            .add_directive("tonic=error".parse()?)
            .add_directive("tower::buffer=off".parse()?)
            .add_directive("opentelemetry-otlp=off".parse()?)
            .add_directive("opentelemetry_sdk=error".parse()?)
            .add_directive("h2=off".parse()?),
    );

    if config.log_to_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_level(true)
            .with_target(false)
            .compact();
        layers.push(fmt_layer.boxed());
    }

    if let Some(dir) = &config.log_dir {
        if !dir.exists() {
            std::fs::create_dir_all(dir).map_err(|err| {
                LoggerError::IOError(format!(
                    "Failed to create logs directory: {dir:?}: {err:?}"
                ))
            })?;
        }
        // <dir>/<service_name>.YYYY-MM-DD
        let file_appender = tracing_appender::rolling::daily(dir, service_name);
        let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
        rolling_appender_guard = Some(guard);

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking_writer)
            .with_level(true)
            .with_target(false)
            .with_ansi(false)
            .compact();
        layers.push(fmt_layer.boxed());
    }

    layers.push(OpenTelemetryLayer::new(tracer_provider.tracer(service_name.to_owned())).boxed());

    if let Err(err) = tracing_subscriber::registry()
        .with(filter)
        .with(layers)
        .try_init()
    {
        if let Err(shutdown_err) = tracer_provider.shutdown() {
            debug!("tracer provider shutdown after failed install: {shutdown_err}");
        }
        return Err(err.into());
    }
    global::set_tracer_provider(tracer_provider.clone());

    info!(
        service_name,
        otlp_url = %config.otlp_url,
        "cloud logging initialized"
    );

    Ok((tracer_provider, rolling_appender_guard))
}

impl LogBackend for CloudBackend {
    fn create_logger(&self, name: &str) -> Box<dyn Logger> {
        Box::new(CloudLogger {
            name: name.to_owned(),
            fields: Fields::new(),
            tracer_provider: self.tracer_provider.clone(),
        })
    }

    fn flush(&self) -> FlushFuture {
        flush_provider(self.tracer_provider.clone())
    }

    fn shutdown(&self) -> Result<(), LoggerError> {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        debug!("shutting down OTLP tracer");
        let result = self.tracer_provider.shutdown().map_err(LoggerError::from);
        // dropping the worker guard flushes the rolling file
        self.rolling_appender_guard
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(runtime) = self
            .exporter_runtime
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            runtime.shutdown_background();
        }
        result
    }
}

impl Drop for CloudBackend {
    fn drop(&mut self) {
        if let Err(err) = LogBackend::shutdown(self) {
            eprintln!("Trace provider shutdown error: {err:?}");
        }
    }
}

fn flush_provider(tracer_provider: SdkTracerProvider) -> FlushFuture {
    Box::pin(async move { tracer_provider.force_flush().map_err(LoggerError::from) })
}

struct CloudLogger {
    name: String,
    fields: Fields,
    tracer_provider: SdkTracerProvider,
}

impl Logger for CloudLogger {
    fn name(&self) -> &str {
        &self.name
    }

    fn log(&self, level: Level, message: &str, fields: Option<&Fields>) {
        let merged = merge_fields(&self.fields, fields);
        let rendered = render_fields(&merged).unwrap_or_default();
        match level {
            Level::Debug => emit!(debug_span, debug, self.name, rendered, message),
            Level::Info => emit!(info_span, info, self.name, rendered, message),
            Level::Warn => emit!(warn_span, warn, self.name, rendered, message),
            Level::Error => emit!(error_span, error, self.name, rendered, message),
        }
    }

    fn child(&self, fields: Fields) -> Box<dyn Logger> {
        Box::new(Self {
            name: self.name.clone(),
            fields: merge_fields(&self.fields, Some(&fields)),
            tracer_provider: self.tracer_provider.clone(),
        })
    }

    fn flush(&self) -> FlushFuture {
        flush_provider(self.tracer_provider.clone())
    }
}
