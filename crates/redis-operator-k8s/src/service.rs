//! Per-kind resource service

use std::sync::Arc;

use tracing::{debug, info, warn};

use redis_operator_common::{Error, Result, Verb, NOT_APPLICABLE};

use crate::kind::ResourceKind;
use crate::selector::LabelSelector;
use crate::store::ResourceStore;
use crate::sync::{synchronize, synchronize_with, Outcome, SyncError};

/// Typed operations for one resource kind.
///
/// Every failure is returned as [`Error::Api`] naming the verb, kind and
/// target. Whether a failure is worth retrying is left to the caller.
pub struct KindService<K: ResourceKind> {
    store: Arc<dyn ResourceStore<K>>,
}

impl<K: ResourceKind> Clone for KindService<K> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

fn name_of<K: ResourceKind>(object: &K) -> Result<&str> {
    object
        .object_name()
        .ok_or_else(|| Error::validation(K::KIND, "object has no metadata.name"))
}

impl<K: ResourceKind> KindService<K> {
    /// Create a service over `store`
    pub fn new(store: Arc<dyn ResourceStore<K>>) -> Self {
        Self { store }
    }

    /// Fetch the live object
    pub async fn get(&self, namespace: &str, name: &str) -> Result<K> {
        self.store
            .fetch(namespace, name)
            .await
            .map_err(|e| Error::api(Verb::Get, K::KIND, namespace, name, e))
    }

    /// Create a new object. Fails if the name is taken.
    pub async fn create(&self, namespace: &str, object: &K) -> Result<K> {
        let name = name_of(object)?;
        let created = self
            .store
            .create(namespace, object)
            .await
            .map_err(|e| Error::api(Verb::Create, K::KIND, namespace, name, e))?;
        info!(namespace = %namespace, kind = K::KIND, name = %name, "created");
        Ok(created)
    }

    /// Replace an existing object. The object's version token must be current.
    pub async fn update(&self, namespace: &str, object: &K) -> Result<K> {
        let name = name_of(object)?;
        let updated = self
            .store
            .update(namespace, object)
            .await
            .map_err(|e| Error::api(Verb::Update, K::KIND, namespace, name, e))?;
        info!(namespace = %namespace, kind = K::KIND, name = %name, "updated");
        Ok(updated)
    }

    /// Create the object, or update it under the live version token.
    pub async fn create_or_update(
        &self,
        namespace: &str,
        desired: K,
    ) -> std::result::Result<Outcome, SyncError> {
        let name = desired.object_name().unwrap_or_default().to_string();
        let result = synchronize(self.store.as_ref(), namespace, desired).await;
        log_outcome::<K>(namespace, &name, &result);
        result
    }

    pub(crate) async fn create_or_replace<F>(
        &self,
        namespace: &str,
        desired: K,
        needs_replace: F,
    ) -> std::result::Result<Outcome, SyncError>
    where
        F: Fn(&K, &K) -> bool + Send,
    {
        let name = desired.object_name().unwrap_or_default().to_string();
        let result = synchronize_with(self.store.as_ref(), namespace, desired, needs_replace).await;
        log_outcome::<K>(namespace, &name, &result);
        result
    }

    /// Create the object unless one with the same name exists.
    ///
    /// Returns whether it was created. An existing object is left untouched.
    pub async fn create_if_not_exists(&self, namespace: &str, desired: &K) -> Result<bool> {
        let name = name_of(desired)?;
        match self.store.fetch(namespace, name).await {
            Ok(_) => Ok(false),
            Err(e) if e.is_not_found() => self.create(namespace, desired).await.map(|_| true),
            Err(e) => Err(Error::api(Verb::Get, K::KIND, namespace, name, e)),
        }
    }

    /// Delete the object, cascading to its dependents in the foreground.
    ///
    /// The API server acknowledges the request before dependents are gone; the
    /// object remains visible until they are.
    pub async fn delete(&self, namespace: &str, name: &str) -> Result<()> {
        self.store
            .delete(namespace, name, true)
            .await
            .map_err(|e| Error::api(Verb::Delete, K::KIND, namespace, name, e))?;
        info!(namespace = %namespace, kind = K::KIND, name = %name, "deleted");
        Ok(())
    }

    /// List every object in the namespace
    pub async fn list(&self, namespace: &str) -> Result<Vec<K>> {
        self.list_matching(namespace, &LabelSelector::everything())
            .await
    }

    /// List objects in the namespace matching `selector`
    pub async fn list_matching(&self, namespace: &str, selector: &LabelSelector) -> Result<Vec<K>> {
        let items = self
            .store
            .list(namespace, selector)
            .await
            .map_err(|e| Error::api(Verb::List, K::KIND, namespace, NOT_APPLICABLE, e))?;
        debug!(
            namespace = %namespace,
            kind = K::KIND,
            selector = %selector,
            count = items.len(),
            "listed"
        );
        Ok(items)
    }

    /// Apply a JSON merge patch
    pub(crate) async fn merge_patch(
        &self,
        namespace: &str,
        name: &str,
        patch: &serde_json::Value,
    ) -> Result<K> {
        self.store
            .patch(namespace, name, patch)
            .await
            .map_err(|e| Error::api(Verb::Patch, K::KIND, namespace, name, e))
    }
}

fn log_outcome<K: ResourceKind>(
    namespace: &str,
    name: &str,
    result: &std::result::Result<Outcome, SyncError>,
) {
    match result {
        Ok(outcome) => info!(
            namespace = %namespace,
            kind = K::KIND,
            name = %name,
            outcome = %outcome,
            "synchronized"
        ),
        Err(e) => warn!(
            namespace = %namespace,
            kind = K::KIND,
            name = %name,
            outcome = %e.outcome(),
            error = %e.error(),
            retryable = e.is_retryable(),
            "synchronize failed"
        ),
    }
}
