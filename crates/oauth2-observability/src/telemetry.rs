use opentelemetry::{global, trace::TracerProvider as _};
use opentelemetry_sdk::{
    propagation::TraceContextPropagator,
    trace::{Sampler, SdkTracerProvider},
    Resource,
};
use std::sync::OnceLock;
use tracing::Span;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Initialize tracing/logging and (optionally) OpenTelemetry export.
///
/// - Always emits structured JSON logs via `tracing_subscriber`.
/// - Bridges `log` records into `tracing`.
/// - Exports spans via OTLP when `OTEL_EXPORTER_OTLP_ENDPOINT` (or
///   `OTEL_EXPORTER_OTLP_TRACES_ENDPOINT`, or the legacy `OAUTH2_OTLP_ENDPOINT`) is set;
///   otherwise a local provider still generates trace/span IDs for log correlation.
pub fn init_telemetry(service_name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let otel_endpoint = env_non_empty("OTEL_EXPORTER_OTLP_ENDPOINT")
        .or_else(|| env_non_empty("OTEL_EXPORTER_OTLP_TRACES_ENDPOINT"));
    if otel_endpoint.is_none() {
        if let Some(endpoint) = env_non_empty("OAUTH2_OTLP_ENDPOINT") {
            std::env::set_var("OTEL_EXPORTER_OTLP_ENDPOINT", endpoint);
        }
    }
    let otlp_enabled = env_non_empty("OTEL_EXPORTER_OTLP_ENDPOINT").is_some()
        || env_non_empty("OTEL_EXPORTER_OTLP_TRACES_ENDPOINT").is_some();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Use W3C trace-context for propagation (traceparent/tracestate).
    global::set_text_map_propagator(TraceContextPropagator::new());

    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .build();

    let builder = SdkTracerProvider::builder()
        .with_resource(resource)
        .with_sampler(Sampler::ParentBased(Box::new(Sampler::AlwaysOn)));
    let provider = if otlp_enabled {
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .build()?;
        builder.with_batch_exporter(exporter).build()
    } else {
        builder.build()
    };

    let tracer = provider.tracer(service_name.to_string());
    global::set_tracer_provider(provider.clone());
    let _ = TRACER_PROVIDER.set(provider);

    let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);

    // with_current_span + with_span_list put the active span stack (and its trace ids)
    // on every JSON line.
    let formatting_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(otel_layer)
        .with(formatting_layer)
        .try_init()?;

    // Ignore errors if a logger was already set (e.g., tests).
    let _ = tracing_log::LogTracer::init();

    Ok(())
}

/// Record OpenTelemetry trace/span identifiers onto a span.
///
/// The span must declare empty `trace_id` and `span_id` fields.
pub fn annotate_span_with_trace_ids(span: &Span) {
    use opentelemetry::trace::TraceContextExt;
    use tracing_opentelemetry::OpenTelemetrySpanExt;
    let cx = span.context();
    let otel_span = cx.span();
    let sc = otel_span.span_context();
    if sc.is_valid() {
        span.record("trace_id", tracing::field::display(sc.trace_id()));
        span.record("span_id", tracing::field::display(sc.span_id()));
    }
}

/// Flush pending spans when an exporter is installed.
pub fn shutdown_telemetry() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(err) = provider.shutdown() {
            eprintln!("failed to shut down tracer provider: {err}");
        }
    }
}
