//! Telemetry for the operator process
//!
//! [`init_telemetry`] installs the JSON log subscriber and the meter provider
//! that Kubernetes operation counts are recorded on. With an OTLP endpoint the
//! counts and traces are pushed to the collector; without one the counts stay
//! in process and only logs leave it. The returned [`Telemetry`] hands out the
//! [`OtelMetricsRecorder`] bound to that provider and flushes it on shutdown.

use std::time::Duration;

use opentelemetry::metrics::MeterProvider as _;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::TracerProvider;
use opentelemetry_sdk::{runtime, Resource};
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::metrics::{OtelMetricsRecorder, METER_NAME};

const DEFAULT_SERVICE_NAME: &str = "redis-operator";
const DEFAULT_LOG_FILTER: &str = "info,redis_operator=debug,kube=info,tower=warn,hyper=warn";
const DEFAULT_METRICS_INTERVAL: Duration = Duration::from_secs(30);

const SERVICE_NAME_ENV: &str = "OTEL_SERVICE_NAME";
const OTLP_ENDPOINT_ENV: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";
const LOG_FILTER_ENV: &str = "RUST_LOG";
const METRICS_INTERVAL_ENV: &str = "REDIS_OPERATOR_METRICS_INTERVAL_SECS";

/// Errors that can occur while setting up or tearing down telemetry
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The log filter could not be parsed
    #[error("invalid log filter: {0}")]
    InvalidFilter(String),

    /// Failed to build the OTLP span exporter
    #[error("failed to initialize tracer: {0}")]
    TracerInit(String),

    /// Failed to build the OTLP metrics exporter
    #[error("failed to initialize metrics exporter: {0}")]
    MetricsInit(String),

    /// A global subscriber is already installed
    #[error("failed to initialize tracing subscriber: {0}")]
    SubscriberInit(String),

    /// Pending spans or metrics could not be flushed
    #[error("failed to shut down telemetry: {0}")]
    Shutdown(String),
}

/// Settings for [`init_telemetry`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// `service.name` resource attribute
    pub service_name: String,

    /// OTLP gRPC endpoint (e.g. "http://otel-collector:4317"). `None` keeps
    /// metrics in process and disables tracing export.
    pub otlp_endpoint: Option<String>,

    /// `EnvFilter` directives for log output
    pub log_filter: String,

    /// How often operation counts are pushed to the collector
    pub metrics_interval: Duration,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            otlp_endpoint: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            metrics_interval: DEFAULT_METRICS_INTERVAL,
        }
    }
}

impl TelemetryConfig {
    /// Read settings from the standard OpenTelemetry variables, `RUST_LOG`,
    /// and `REDIS_OPERATOR_METRICS_INTERVAL_SECS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key| lookup(key).filter(|v: &String| !v.trim().is_empty());
        Self {
            service_name: non_empty(SERVICE_NAME_ENV).unwrap_or(defaults.service_name),
            otlp_endpoint: non_empty(OTLP_ENDPOINT_ENV),
            log_filter: non_empty(LOG_FILTER_ENV).unwrap_or(defaults.log_filter),
            metrics_interval: non_empty(METRICS_INTERVAL_ENV)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.metrics_interval),
        }
    }
}

/// Installed telemetry pipeline
#[derive(Debug)]
pub struct Telemetry {
    meter_provider: SdkMeterProvider,
    tracer_provider: Option<TracerProvider>,
}

impl Telemetry {
    /// Recorder counting Kubernetes operations on this pipeline's meter
    pub fn recorder(&self) -> OtelMetricsRecorder {
        OtelMetricsRecorder::new(&self.meter_provider.meter(METER_NAME))
    }

    /// Whether spans and metrics leave the process
    pub fn exports(&self) -> bool {
        self.tracer_provider.is_some()
    }

    /// Flush pending spans and operation counts to the collector.
    pub fn shutdown(self) -> Result<(), TelemetryError> {
        let Some(tracer_provider) = self.tracer_provider else {
            return Ok(());
        };
        tracer_provider
            .shutdown()
            .map_err(|e| TelemetryError::Shutdown(e.to_string()))?;
        self.meter_provider
            .shutdown()
            .map_err(|e| TelemetryError::Shutdown(e.to_string()))
    }
}

/// Install logging, metrics and (with an endpoint) trace export.
///
/// Nothing global is replaced unless the log subscriber installs, so a second
/// call fails with [`TelemetryError::SubscriberInit`] and leaves the first
/// pipeline in place. Needs a Tokio runtime when an endpoint is configured.
pub fn init_telemetry(config: TelemetryConfig) -> Result<Telemetry, TelemetryError> {
    let env_filter = EnvFilter::try_new(&config.log_filter)
        .map_err(|e| TelemetryError::InvalidFilter(e.to_string()))?;

    let resource = build_resource(&config.service_name);
    let meter_provider = build_meter_provider(&config, resource.clone())?;
    let tracer_provider = config
        .otlp_endpoint
        .as_deref()
        .map(|endpoint| build_tracer_provider(endpoint, resource))
        .transpose()?;

    let otel_layer = tracer_provider.as_ref().map(|provider| {
        tracing_opentelemetry::layer().with_tracer(provider.tracer(config.service_name.clone()))
    });

    let fmt_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_target(true)
        .with_file(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()
        .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;

    global::set_text_map_propagator(TraceContextPropagator::new());
    global::set_meter_provider(meter_provider.clone());
    if let Some(provider) = &tracer_provider {
        global::set_tracer_provider(provider.clone());
    }

    Ok(Telemetry {
        meter_provider,
        tracer_provider,
    })
}

fn build_resource(service_name: &str) -> Resource {
    let mut attributes = vec![
        KeyValue::new(
            opentelemetry_semantic_conventions::resource::SERVICE_NAME,
            service_name.to_string(),
        ),
        KeyValue::new(
            opentelemetry_semantic_conventions::resource::SERVICE_VERSION,
            env!("CARGO_PKG_VERSION"),
        ),
    ];

    // Set through the downward API in the operator Deployment
    for (var, key) in [
        ("POD_NAME", "k8s.pod.name"),
        ("POD_NAMESPACE", "k8s.namespace.name"),
        ("NODE_NAME", "k8s.node.name"),
    ] {
        if let Ok(value) = std::env::var(var) {
            attributes.push(KeyValue::new(key, value));
        }
    }

    Resource::new(attributes)
}

fn build_meter_provider(
    config: &TelemetryConfig,
    resource: Resource,
) -> Result<SdkMeterProvider, TelemetryError> {
    let builder = SdkMeterProvider::builder().with_resource(resource);
    let Some(endpoint) = &config.otlp_endpoint else {
        return Ok(builder.build());
    };

    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    let reader = PeriodicReader::builder(exporter, runtime::Tokio)
        .with_interval(config.metrics_interval)
        .build();

    Ok(builder.with_reader(reader).build())
}

fn build_tracer_provider(endpoint: &str, resource: Resource) -> Result<TracerProvider, TelemetryError> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| TelemetryError::TracerInit(e.to_string()))?;

    Ok(TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_resource(resource)
        .build())
}
