use std::time::Duration;

use devkit_config::CloudLogConfig;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    trace::{RandomIdGenerator, Sampler, SdkTracerProvider},
    Resource,
};
use opentelemetry_semantic_conventions::{
    attribute::{DEPLOYMENT_ENVIRONMENT_NAME, SERVICE_NAME, SERVICE_VERSION},
    SCHEMA_URL,
};

use crate::LoggerError;

fn resource(service_name: &str, config: &CloudLogConfig) -> Resource {
    let mut attributes = vec![KeyValue::new(SERVICE_NAME, service_name.to_owned())];
    if let Some(version) = &config.version {
        attributes.push(KeyValue::new(SERVICE_VERSION, version.clone()));
    }
    if let Some(environment) = &config.environment {
        attributes.push(KeyValue::new(DEPLOYMENT_ENVIRONMENT_NAME, environment.clone()));
    }
    Resource::builder()
        .with_service_name(service_name.to_owned())
        .with_schema_url(attributes, SCHEMA_URL)
        .build()
}

/// Build the batch OTLP (gRPC) tracer provider.
///
/// The tonic exporter needs a running tokio runtime.
pub(crate) fn init_tracer_provider(
    service_name: &str,
    config: &CloudLogConfig,
) -> Result<SdkTracerProvider, LoggerError> {
    let otlp_exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_url.clone())
        .with_timeout(Duration::from_secs(3))
        .build()
        .map_err(|e| {
            LoggerError::Otlp(format!(
                "Failed to create OTLP exporter for {}: {e}",
                config.otlp_url
            ))
        })?;

    let tracer_provider = SdkTracerProvider::builder()
        .with_batch_exporter(otlp_exporter)
        .with_id_generator(RandomIdGenerator::default())
        .with_sampler(Sampler::AlwaysOn)
        .with_resource(resource(service_name, config))
        .with_max_events_per_span(64)
        .with_max_attributes_per_span(16)
        .build();

    Ok(tracer_provider)
}
