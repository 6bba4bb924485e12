//! Observability wiring.
//!
//! Every crate emits `tracing` spans and events; this module decides where
//! they go: a human-readable or JSON layer on stderr, filtered by `RUST_LOG`,
//! and optionally an OpenTelemetry OTLP exporter.

use anyhow::Context;
use clap::ValueEnum;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, trace::TracerProvider, Resource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const SERVICE_NAME: &str = "size-census";

/// Log line format on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines without targets.
    Pretty,
    /// One JSON object per event, for log shippers.
    Json,
}

/// Keeps the OTLP pipeline alive; call [`TelemetryGuard::shutdown`] before exit
/// so buffered spans are flushed.
pub struct TelemetryGuard {
    provider: Option<TracerProvider>,
}

impl TelemetryGuard {
    /// Flushes and stops the OTLP exporter, if one was installed. A flush
    /// failure is printed to stderr and otherwise ignored.
    pub fn shutdown(self) {
        if let Some(provider) = self.provider {
            if let Err(error) = provider.shutdown() {
                eprintln!("Failed to flush traces: {error}");
            }
        }
    }
}

/// Default filter when `RUST_LOG` is unset.
fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "info,census=debug,github=debug,size_census=debug"
    } else {
        "warn"
    }
}

/// Installs the global subscriber.
pub fn init(
    verbose: bool,
    format: LogFormat,
    otlp_endpoint: Option<&str>,
) -> anyhow::Result<TelemetryGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    let fmt_layer = match format {
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed(),
    };

    let provider = otlp_endpoint.map(otlp_provider).transpose()?;
    let otel_layer = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer(SERVICE_NAME)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()
        .context("installing tracing subscriber")?;

    Ok(TelemetryGuard { provider })
}

fn otlp_provider(endpoint: &str) -> anyhow::Result<TracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .with_context(|| format!("building OTLP exporter for {endpoint}"))?;

    Ok(TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_resource(Resource::new(vec![KeyValue::new(
            "service.name",
            SERVICE_NAME,
        )]))
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_without_exporter_shuts_down_quietly() {
        TelemetryGuard { provider: None }.shutdown();
    }

    #[test]
    fn test_default_filter_is_quiet() {
        assert_eq!(default_directives(false), "warn");
        assert!(EnvFilter::try_new(default_directives(true)).is_ok());
    }
}
