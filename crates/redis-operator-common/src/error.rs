//! Error types for the Redis operator
//!
//! Kubernetes failures are carried as an [`ApiError`] whose [`ApiErrorKind`]
//! is derived from the structured status returned by the API server. Service
//! operations wrap it in [`Error::Api`] together with the verb, resource kind
//! and target so callers can log it and decide whether to retry.

use std::fmt;

use thiserror::Error;

use crate::operation::Verb;

/// Classification of a failed backing store call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// The object does not exist
    NotFound,
    /// An object with the same name already exists
    AlreadyExists,
    /// Stale resourceVersion on write
    Conflict,
    /// Caller lacks permission
    Forbidden,
    /// Caller is not authenticated
    Unauthorized,
    /// Object rejected by server-side validation
    Invalid,
    /// Request or server timed out
    Timeout,
    /// API server unreachable, overloaded or failing
    Unavailable,
    /// Anything else
    Other,
}

impl ApiErrorKind {
    /// Convert to label value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::Conflict => "conflict",
            Self::Forbidden => "forbidden",
            Self::Unauthorized => "unauthorized",
            Self::Invalid => "invalid",
            Self::Timeout => "timeout",
            Self::Unavailable => "unavailable",
            Self::Other => "other",
        }
    }

    /// Whether a later attempt of the same request may succeed unchanged
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Conflict | Self::Timeout | Self::Unavailable)
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed call to the backing store
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    /// Structured classification
    pub kind: ApiErrorKind,
    /// Human readable message from the server or transport
    pub message: String,
    /// The underlying kube-rs error, when there is one
    #[source]
    pub source: Option<kube::Error>,
}

impl ApiError {
    /// Create an error of the given kind without an underlying cause
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a NotFound error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::NotFound, message)
    }

    /// Attach the kube-rs error this was classified from
    pub fn with_source(mut self, source: kube::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Whether this error means the object does not exist
    pub fn is_not_found(&self) -> bool {
        self.kind == ApiErrorKind::NotFound
    }
}

/// Main error type for operator operations
#[derive(Debug, Error)]
pub enum Error {
    /// A Kubernetes API call failed
    #[error("{verb} {kind} {namespace}/{name} failed: {source}")]
    Api {
        /// Verb that failed
        verb: Verb,
        /// Resource kind (e.g. "StatefulSet")
        kind: &'static str,
        /// Target namespace (empty for cluster-scoped kinds)
        namespace: String,
        /// Target object name, or `-` when there is no single target
        name: String,
        /// Classified store error
        #[source]
        source: ApiError,
    },

    /// A desired object could not be used as given
    #[error("validation error for {kind}: {message}")]
    Validation {
        /// Resource kind of the offending object
        kind: String,
        /// Description of what's invalid
        message: String,
    },
}

impl Error {
    /// Wrap a store error with the operation it came from
    pub fn api(
        verb: Verb,
        kind: &'static str,
        namespace: impl Into<String>,
        name: impl Into<String>,
        source: ApiError,
    ) -> Self {
        Self::Api {
            verb,
            kind,
            namespace: namespace.into(),
            name: name.into(),
            source,
        }
    }

    /// Create a validation error for the given resource kind
    pub fn validation(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            kind: kind.into(),
            message: msg.into(),
        }
    }

    /// Classification of the store error, if this is an API failure
    pub fn api_error_kind(&self) -> Option<ApiErrorKind> {
        match self {
            Error::Api { source, .. } => Some(source.kind),
            _ => None,
        }
    }

    /// The verb that failed, if this is an API failure
    pub fn verb(&self) -> Option<Verb> {
        match self {
            Error::Api { verb, .. } => Some(*verb),
            _ => None,
        }
    }

    /// Whether the object targeted by the failed call does not exist
    pub fn is_not_found(&self) -> bool {
        self.api_error_kind() == Some(ApiErrorKind::NotFound)
    }

    /// Whether the failed write lost an optimistic-concurrency race
    pub fn is_conflict(&self) -> bool {
        self.api_error_kind() == Some(ApiErrorKind::Conflict)
    }

    /// Check if the reconciliation loop should retry this error
    ///
    /// Conflicts and transport failures are retryable. Permission, validation
    /// and absence errors need a change elsewhere before a retry can succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Api { source, .. } => source.kind.is_transient(),
            Error::Validation { .. } => false,
        }
    }
}
