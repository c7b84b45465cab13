//! Metrics for Kubernetes API operations
//!
//! Every call the operator makes against the API server is reported through a
//! [`MetricsRecorder`]. Recording is fire-and-forget: implementations must not
//! block and never return an error to the caller.

use opentelemetry::global;
use opentelemetry::metrics::{Counter, Meter};
use opentelemetry::KeyValue;

#[cfg(test)]
use mockall::automock;

use crate::error::ApiErrorKind;
use crate::operation::Verb;

/// Name of the meter every operator instrument is created from
pub const METER_NAME: &str = "redis-operator";

/// Counter of Kubernetes API operations
///
/// Labels:
/// - `namespace`: target namespace (empty for cluster-scoped kinds)
/// - `kind`: resource kind, e.g. StatefulSet
/// - `object`: object name, `-` for list operations
/// - `operation`: GET, CREATE, UPDATE, PATCH, DELETE, LIST
/// - `status`: success, fail
/// - `error_kind`: classification of the failure, empty on success
pub fn k8s_operations_counter(meter: &Meter) -> Counter<u64> {
    meter
        .u64_counter("redis_operator_k8s_operations_total")
        .with_description("Total number of Kubernetes API operations")
        .with_unit("{operations}")
        .build()
}

/// Labels for operation status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    /// The call succeeded
    Success,
    /// The call returned an error
    Fail,
}

impl OperationStatus {
    /// Convert to label value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Fail => "fail",
        }
    }

    /// Status for the result of a store call
    pub fn from_error(error: Option<ApiErrorKind>) -> Self {
        match error {
            Some(_) => Self::Fail,
            None => Self::Success,
        }
    }
}

/// Sink for Kubernetes operation metrics.
#[cfg_attr(test, automock)]
pub trait MetricsRecorder: Send + Sync {
    /// Record one attempted operation against the API server.
    ///
    /// # Arguments
    ///
    /// * `namespace` - Target namespace
    /// * `kind` - Resource kind name
    /// * `object` - Object name, or [`crate::NOT_APPLICABLE`] for lists
    /// * `verb` - Operation attempted
    /// * `error` - Classification of the failure, `None` on success
    fn record_k8s_operation(
        &self,
        namespace: &str,
        kind: &str,
        object: &str,
        verb: Verb,
        error: Option<ApiErrorKind>,
    );
}

/// Production recorder counting operations on an OpenTelemetry meter.
///
/// Instruments are bound to the meter provider that is current when the
/// recorder is built. Build it from
/// [`crate::telemetry::Telemetry::recorder`] so counts reach the exporter.
#[derive(Clone)]
pub struct OtelMetricsRecorder {
    operations: Counter<u64>,
}

impl OtelMetricsRecorder {
    /// Recorder whose counter is created from `meter`
    pub fn new(meter: &Meter) -> Self {
        Self {
            operations: k8s_operations_counter(meter),
        }
    }
}

impl Default for OtelMetricsRecorder {
    fn default() -> Self {
        Self::new(&global::meter(METER_NAME))
    }
}

impl MetricsRecorder for OtelMetricsRecorder {
    fn record_k8s_operation(
        &self,
        namespace: &str,
        kind: &str,
        object: &str,
        verb: Verb,
        error: Option<ApiErrorKind>,
    ) {
        self.operations
            .add(1, &operation_labels(namespace, kind, object, verb, error));
    }
}

/// No-op recorder for tests and for callers that don't export metrics.
#[derive(Clone, Default)]
pub struct NoopMetricsRecorder;

impl MetricsRecorder for NoopMetricsRecorder {
    fn record_k8s_operation(
        &self,
        _namespace: &str,
        _kind: &str,
        _object: &str,
        _verb: Verb,
        _error: Option<ApiErrorKind>,
    ) {
    }
}

fn operation_labels(
    namespace: &str,
    kind: &str,
    object: &str,
    verb: Verb,
    error: Option<ApiErrorKind>,
) -> [KeyValue; 6] {
    [
        KeyValue::new("namespace", namespace.to_string()),
        KeyValue::new("kind", kind.to_string()),
        KeyValue::new("object", object.to_string()),
        KeyValue::new("operation", verb.as_str()),
        KeyValue::new("status", OperationStatus::from_error(error).as_str()),
        KeyValue::new(
            "error_kind",
            error.map(|kind| kind.as_str()).unwrap_or_default(),
        ),
    ]
}
