//! Tracing setup for folio binaries.
//!
//! [`init`] installs the subscriber every binary uses: an `EnvFilter`
//! (default `info`, overridable with `RUST_LOG`) and a `fmt` layer on
//! stderr. With the `telemetry` feature it also adds an OpenTelemetry layer
//! when the standard OTel environment asks for export:
//!
//! ```bash
//! OTEL_EXPORTER_OTLP_ENDPOINT=http://localhost:4317 \
//!   cargo run -p folio-server --features telemetry
//! ```
//!
//! Set `OTEL_SDK_DISABLED=true` to turn export off even when the endpoint is set.
//!
//! Span names carry a category prefix that the sampler keys on:
//! `http.*` for request handling, `store.*` for database calls and `sync.*`
//! for editor commits.

#[cfg(feature = "telemetry")]
mod otel;
mod sampling;

#[cfg(feature = "telemetry")]
pub use otel::{otel_layer, OtelGuard};
pub use sampling::sample_rate;

use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Failure to set up OTel export.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to build OTLP exporter: {0}")]
    Exporter(String),
    #[error("failed to start exporter runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Whether OTel export should be enabled, per the process environment.
pub fn otel_enabled() -> bool {
    otel_enabled_with(|key| std::env::var(key).ok())
}

/// [`otel_enabled`] against an arbitrary variable lookup.
///
/// Enabled when `OTEL_SDK_DISABLED` is not `true` and either
/// `OTEL_EXPORTER_OTLP_ENDPOINT` is set or `OTEL_TRACES_EXPORTER` is set to
/// something other than `none`.
pub fn otel_enabled_with(var: impl Fn(&str) -> Option<String>) -> bool {
    if var("OTEL_SDK_DISABLED").is_some_and(|v| v.eq_ignore_ascii_case("true")) {
        return false;
    }
    if var("OTEL_EXPORTER_OTLP_ENDPOINT").is_some() {
        return true;
    }
    var("OTEL_TRACES_EXPORTER").is_some_and(|e| !e.eq_ignore_ascii_case("none"))
}

/// Keeps telemetry alive; drop it at the very end of `main` so pending spans
/// are flushed.
#[must_use = "dropping the guard stops span export"]
pub struct TelemetryGuard {
    #[cfg(feature = "telemetry")]
    _otel: Option<OtelGuard>,
}

/// Install the global subscriber for `service_name`.
pub fn init(service_name: &str) -> TelemetryGuard {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr));

    #[cfg(feature = "telemetry")]
    let otel = if otel_enabled() {
        match otel_layer(service_name) {
            Ok((layer, guard)) => {
                registry.with(layer).init();
                tracing::info!(service = service_name, "OpenTelemetry export enabled");
                Some(guard)
            }
            Err(e) => {
                registry.init();
                tracing::warn!(error = %e, "OpenTelemetry export disabled");
                None
            }
        }
    } else {
        registry.init();
        None
    };

    #[cfg(not(feature = "telemetry"))]
    registry.init();

    tracing::debug!(service = service_name, "tracing initialized");
    TelemetryGuard {
        #[cfg(feature = "telemetry")]
        _otel: otel,
    }
}
