//! Classification of kube-rs errors
//!
//! The API server reports failures as a `Status` object with a machine
//! readable `reason` and an HTTP `code`. Classification reads those fields
//! only. Message text is never inspected, so a timeout or permission failure
//! can never be mistaken for an absent object.

use redis_operator_common::{ApiError, ApiErrorKind};

/// Classify a kube-rs error.
///
/// The status `reason` wins when it is one the API server defines; otherwise
/// the HTTP code decides. Transport-level failures (connection refused, TLS,
/// client-side timeouts) are `Unavailable`.
pub fn classify(err: &kube::Error) -> ApiErrorKind {
    match err {
        kube::Error::Api(status) => {
            kind_from_reason(&status.reason).unwrap_or_else(|| kind_from_code(status.code))
        }
        kube::Error::HyperError(_) | kube::Error::Service(_) => ApiErrorKind::Unavailable,
        _ => ApiErrorKind::Other,
    }
}

/// Convert a kube-rs error into a classified [`ApiError`], keeping the source.
pub fn api_error(err: kube::Error) -> ApiError {
    let kind = classify(&err);
    let message = match &err {
        kube::Error::Api(status) => status.message.clone(),
        other => other.to_string(),
    };
    ApiError::new(kind, message).with_source(err)
}

fn kind_from_reason(reason: &str) -> Option<ApiErrorKind> {
    let kind = match reason {
        "NotFound" => ApiErrorKind::NotFound,
        "AlreadyExists" => ApiErrorKind::AlreadyExists,
        "Conflict" => ApiErrorKind::Conflict,
        "Forbidden" => ApiErrorKind::Forbidden,
        "Unauthorized" => ApiErrorKind::Unauthorized,
        "Invalid" | "BadRequest" => ApiErrorKind::Invalid,
        "Timeout" | "ServerTimeout" => ApiErrorKind::Timeout,
        "ServiceUnavailable" | "TooManyRequests" | "InternalError" => ApiErrorKind::Unavailable,
        _ => return None,
    };
    Some(kind)
}

fn kind_from_code(code: u16) -> ApiErrorKind {
    match code {
        404 => ApiErrorKind::NotFound,
        409 => ApiErrorKind::Conflict,
        403 => ApiErrorKind::Forbidden,
        401 => ApiErrorKind::Unauthorized,
        400 | 422 => ApiErrorKind::Invalid,
        408 | 504 => ApiErrorKind::Timeout,
        429 | 500..=599 => ApiErrorKind::Unavailable,
        _ => ApiErrorKind::Other,
    }
}
