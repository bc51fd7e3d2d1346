//! Tracing and logging setup module.
//!
//! This module provides:
//! - Structured logging (pretty in development, JSON elsewhere)
//! - Optional OTLP export of `tracing` spans, tagged with the service tags
//! - Span constructors for database work and import runs

use anyhow::{Context, Result};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::{Sampler, SdkTracer, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use tracing::Subscriber;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

use crate::observability_config::ObservabilityConfig;

fn log_filter(config: &ObservabilityConfig) -> Result<EnvFilter> {
    let mut filter = EnvFilter::from_default_env()
        .add_directive(format!("meal_prep={}", config.log_level).parse()?)
        .add_directive("sqlx=warn".parse()?)
        .add_directive("tower_http=info".parse()?);

    if let Ok(level) = std::env::var("OBSERVABILITY_MODULE_LOG_LEVEL") {
        filter = filter.add_directive(format!("meal_prep::observability={}", level).parse()?);
    }
    Ok(filter)
}

/// Install the global tracing subscriber without trace export
///
/// `LOG_FORMAT=pretty` forces human-readable output outside development.
pub fn init_tracing_with_config(config: &ObservabilityConfig) -> Result<()> {
    install_subscriber(config, None)
}

/// Install the subscriber, exporting spans over OTLP when `OTLP_ENDPOINT` is set
pub async fn init_tracing_with_otlp(config: &ObservabilityConfig) -> Result<()> {
    let Some(endpoint) = &config.otlp_endpoint else {
        install_subscriber(config, None)?;
        tracing::info!("OpenTelemetry tracing disabled (no OTLP endpoint configured)");
        return Ok(());
    };

    let provider = build_tracer_provider(config, endpoint)?;
    let tracer = provider.tracer("meal-prep");
    global::set_tracer_provider(provider);
    install_subscriber(config, Some(tracer))?;

    tracing::info!(
        otlp_endpoint = %endpoint,
        sampling_ratio = %config.trace_sampling_ratio,
        tags = config.tags.len(),
        "OpenTelemetry trace export enabled"
    );
    Ok(())
}

fn install_subscriber(config: &ObservabilityConfig, tracer: Option<SdkTracer>) -> Result<()> {
    let pretty = config.is_development()
        || std::env::var("LOG_FORMAT").is_ok_and(|format| format == "pretty");

    let otel_layer = tracer.map(span_export_layer);
    let pretty_layer = pretty.then(|| {
        tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(false)
    });
    let json_layer = (!pretty).then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
    });

    tracing_subscriber::registry()
        .with(log_filter(config)?)
        .with(otel_layer)
        .with(pretty_layer)
        .with(json_layer)
        .try_init()
        .context("Tracing subscriber already installed")?;

    tracing::info!(
        environment = %config.environment,
        log_level = %config.log_level,
        format = if pretty { "pretty" } else { "json" },
        "Logging initialized"
    );
    Ok(())
}

/// Bridge `tracing` spans into the OpenTelemetry tracer
fn span_export_layer<S>(tracer: SdkTracer) -> OpenTelemetryLayer<S, SdkTracer>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    tracing_opentelemetry::layer().with_tracer(tracer)
}

/// OTLP tracer provider tagged with the service tags
fn build_tracer_provider(config: &ObservabilityConfig, endpoint: &str) -> Result<SdkTracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint.to_string())
        .build()?;

    let resource = Resource::builder()
        .with_service_name("meal-prep")
        .with_attributes(
            config
                .tags
                .iter()
                .map(|(key, value)| KeyValue::new(key.clone(), value.clone())),
        )
        .build();

    let mut builder = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource);
    if config.enable_trace_sampling {
        builder = builder.with_sampler(Sampler::TraceIdRatioBased(config.trace_sampling_ratio));
    }
    Ok(builder.build())
}

/// Create a span for database operations
pub fn db_span(operation: &str, table: &str) -> tracing::Span {
    tracing::info_span!(
        "db_operation",
        operation = operation,
        table = table,
        component = "database"
    )
}

/// Create a span for a meal import run
pub fn import_span(source: &str, record_count: usize) -> tracing::Span {
    tracing::info_span!(
        "meal_import",
        source = source,
        record_count = record_count,
        component = "importer"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry_sdk::trace::InMemorySpanExporter;

    #[test]
    fn test_tracing_spans_reach_the_exporter() {
        let exporter = InMemorySpanExporter::default();
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        let subscriber =
            tracing_subscriber::registry().with(span_export_layer(provider.tracer("meal-prep")));

        tracing::subscriber::with_default(subscriber, || {
            let span = db_span("select_recipe", "recipes");
            let _entered = span.enter();
        });
        provider.force_flush().unwrap();

        let spans = exporter.get_finished_spans().unwrap();
        assert!(spans.iter().any(|span| span.name == "db_operation"));
    }

    #[tokio::test]
    async fn test_provider_builds_with_service_tags() {
        let mut config = ObservabilityConfig::default();
        config.tags.push(("service".to_string(), "meal-prep".to_string()));

        let provider = build_tracer_provider(&config, "http://localhost:4317");
        assert!(provider.is_ok());
    }
}
