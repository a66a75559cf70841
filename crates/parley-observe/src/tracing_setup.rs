//! Tracing subscriber initialization with structured logging and optional
//! OpenTelemetry trace export.

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use std::sync::OnceLock;

/// Kept so the provider can be flushed and shut down on process exit.
static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

/// How to initialize the subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingOptions {
    /// Bridge tracing spans to OpenTelemetry with a stdout exporter.
    /// Suitable for local development; swap for OTLP in production.
    pub enable_otel: bool,
    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,
}

/// Initialize the global tracing subscriber.
///
/// Installs a fmt layer with target visibility and span close timing, and
/// respects `RUST_LOG` via `EnvFilter`. With `enable_otel`, spans are
/// additionally exported through OpenTelemetry.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been set.
pub fn init_tracing(options: TracingOptions) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::from_default_env();

    if options.json_logs {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(build_otel_layer(options.enable_otel))
            .init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(build_otel_layer(options.enable_otel))
            .init();
    }

    Ok(())
}

/// Build the optional OpenTelemetry layer for a subscriber `S`.
///
/// Generic over `S` so the same construction can be attached to either the
/// JSON or human-readable fmt layer without the two branches forcing a single
/// concrete subscriber type.
fn build_otel_layer<S>(
    enable: bool,
) -> Option<tracing_opentelemetry::OpenTelemetryLayer<S, opentelemetry_sdk::trace::SdkTracer>>
where
    S: tracing::Subscriber + for<'span> tracing_subscriber::registry::LookupSpan<'span>,
{
    enable.then(|| {
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .build();
        let tracer = provider.tracer("parley");

        let _ = TRACER_PROVIDER.set(provider.clone());
        opentelemetry::global::set_tracer_provider(provider);

        tracing_opentelemetry::layer().with_tracer(tracer)
    })
}

/// Flush pending spans and shut down the OTel tracer provider.
///
/// Safe to call when OTel was never enabled (no-op in that case).
pub fn shutdown_tracing() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(e) = provider.shutdown() {
            eprintln!("Warning: OTel tracer provider shutdown error: {e}");
        }
    }
}
