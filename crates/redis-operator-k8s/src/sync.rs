//! Fetch-compare-act synchronization
//!
//! [`synchronize`] drives one desired object towards the store: fetch the live
//! object, create it when absent, otherwise update it under the version token
//! the store just returned. The caller's own token is never trusted. A write
//! that loses a race with another writer fails with a conflict and the next
//! reconcile pass starts over from a fresh fetch; nothing is retried here.

use std::fmt;

use thiserror::Error;

use redis_operator_common::{Error, Verb};

use crate::kind::ResourceKind;
use crate::store::ResourceStore;

/// What a synchronize attempt did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The object was absent and has been created
    Created,
    /// The object existed and has been replaced with the desired state
    Updated,
    /// Reading the live object failed for a reason other than absence
    FetchFailed,
    /// The object was absent and creating it failed
    CreateFailed,
    /// The object existed and writing the desired state failed
    UpdateFailed,
}

impl Outcome {
    /// Convert to log value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::FetchFailed => "fetch_failed",
            Self::CreateFailed => "create_failed",
            Self::UpdateFailed => "update_failed",
        }
    }

    /// Whether the store now holds the desired state
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Created | Self::Updated)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed synchronize attempt: which step failed, and why.
#[derive(Debug, Error)]
#[error("{outcome}: {source}")]
pub struct SyncError {
    outcome: Outcome,
    #[source]
    source: Error,
}

impl SyncError {
    pub(crate) fn new(outcome: Outcome, source: Error) -> Self {
        debug_assert!(!outcome.is_success(), "{outcome} is not a failure");
        Self { outcome, source }
    }

    /// The failing outcome
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// The underlying error, carrying verb, kind, target and classification
    pub fn error(&self) -> &Error {
        &self.source
    }

    /// Whether a later reconcile pass may succeed without any change
    pub fn is_retryable(&self) -> bool {
        self.source.is_retryable()
    }
}

impl From<SyncError> for Error {
    fn from(err: SyncError) -> Self {
        err.source
    }
}

/// Make the store hold `desired` under `namespace`.
///
/// Issues one fetch and then exactly one create or one update. The update
/// carries the version token from the fetch, so a concurrent write between the
/// two calls surfaces as a conflict instead of being overwritten.
pub async fn synchronize<K: ResourceKind>(
    store: &dyn ResourceStore<K>,
    namespace: &str,
    desired: K,
) -> Result<Outcome, SyncError> {
    synchronize_with(store, namespace, desired, |_, _| false).await
}

/// Like [`synchronize`], but an existing object for which `needs_replace`
/// returns true is deleted and created again instead of updated.
///
/// Used for kinds with fields the API server refuses to change in place. The
/// delete does not cascade. A failed delete is reported as
/// [`Outcome::UpdateFailed`].
pub async fn synchronize_with<K, F>(
    store: &dyn ResourceStore<K>,
    namespace: &str,
    mut desired: K,
    needs_replace: F,
) -> Result<Outcome, SyncError>
where
    K: ResourceKind,
    F: Fn(&K, &K) -> bool + Send,
{
    let Some(name) = desired.object_name().map(str::to_string) else {
        return Err(SyncError::new(
            Outcome::FetchFailed,
            Error::validation(K::KIND, "desired object has no metadata.name"),
        ));
    };
    let api_error = |verb, source| Error::api(verb, K::KIND, namespace, name.as_str(), source);

    let stored = match store.fetch(namespace, &name).await {
        Ok(stored) => stored,
        Err(err) if err.is_not_found() => {
            desired.set_version_token(None);
            return match store.create(namespace, &desired).await {
                Ok(_) => Ok(Outcome::Created),
                Err(err) => Err(SyncError::new(
                    Outcome::CreateFailed,
                    api_error(Verb::Create, err),
                )),
            };
        }
        Err(err) => {
            return Err(SyncError::new(
                Outcome::FetchFailed,
                api_error(Verb::Get, err),
            ))
        }
    };

    if needs_replace(&stored, &desired) {
        if let Err(err) = store.delete(namespace, &name, false).await {
            return Err(SyncError::new(
                Outcome::UpdateFailed,
                api_error(Verb::Delete, err),
            ));
        }
        desired.set_version_token(None);
        return match store.create(namespace, &desired).await {
            Ok(_) => Ok(Outcome::Created),
            Err(err) => Err(SyncError::new(
                Outcome::CreateFailed,
                api_error(Verb::Create, err),
            )),
        };
    }

    desired.set_version_token(stored.version_token().map(str::to_string));
    match store.update(namespace, &desired).await {
        Ok(_) => Ok(Outcome::Updated),
        Err(err) => Err(SyncError::new(
            Outcome::UpdateFailed,
            api_error(Verb::Update, err),
        )),
    }
}
