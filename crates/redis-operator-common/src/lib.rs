//! Common types for the Redis operator: CRDs, errors, metrics, and telemetry

#![deny(missing_docs)]

pub mod crd;
pub mod error;
pub mod metrics;
pub mod operation;
pub mod telemetry;

pub use error::{ApiError, ApiErrorKind, Error};
pub use metrics::{MetricsRecorder, NoopMetricsRecorder, OtelMetricsRecorder};
pub use operation::{Verb, NOT_APPLICABLE};

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

