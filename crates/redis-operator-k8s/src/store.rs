//! Backing store abstraction over the Kubernetes API server
//!
//! [`ResourceStore`] is the seam between the reconciliation protocol and the
//! transport. [`KubeStore`] implements it with kube-rs; tests substitute fakes
//! and mocks. [`StoreProvider`] hands out one store per kind so the services
//! facade can be wired without knowing which implementation backs it.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use kube::api::{DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::Client;

use redis_operator_common::{ApiError, ApiErrorKind, MetricsRecorder};

use crate::classify::api_error;
use crate::instrumented::Instrumented;
use crate::kind::ResourceKind;
use crate::selector::LabelSelector;

/// Raw operations against the API server for one resource kind.
///
/// For cluster-scoped kinds the `namespace` argument is ignored.
#[async_trait]
pub trait ResourceStore<K: ResourceKind>: Send + Sync {
    /// Fetch the live object
    async fn fetch(&self, namespace: &str, name: &str) -> Result<K, ApiError>;

    /// Create the object, returning what the server stored
    async fn create(&self, namespace: &str, object: &K) -> Result<K, ApiError>;

    /// Replace the object. The server rejects the write with a conflict if the
    /// object's version token is stale.
    async fn update(&self, namespace: &str, object: &K) -> Result<K, ApiError>;

    /// Apply a JSON merge patch to the object
    async fn patch(
        &self,
        namespace: &str,
        name: &str,
        patch: &serde_json::Value,
    ) -> Result<K, ApiError>;

    /// Delete the object. With `cascade`, foreground propagation is requested so
    /// the object only disappears once its dependents are gone.
    async fn delete(&self, namespace: &str, name: &str, cascade: bool) -> Result<(), ApiError>;

    /// List objects in the namespace matching the selector
    async fn list(&self, namespace: &str, selector: &LabelSelector) -> Result<Vec<K>, ApiError>;
}

/// Source of per-kind stores.
pub trait StoreProvider {
    /// Store for kind `K`
    fn store<K: ResourceKind>(&self) -> Arc<dyn ResourceStore<K>>;
}

/// [`ResourceStore`] backed by a kube-rs [`Client`].
pub struct KubeStore<K> {
    client: Client,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ResourceKind> KubeStore<K> {
    /// Create a store issuing requests through `client`
    pub fn new(client: Client) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }

    fn api(&self, namespace: &str) -> kube::Api<K> {
        K::api(self.client.clone(), namespace)
    }
}

/// Foreground propagation keeps the object until its dependents are gone.
fn delete_params(cascade: bool) -> DeleteParams {
    if cascade {
        DeleteParams::foreground()
    } else {
        DeleteParams::default()
    }
}

fn list_params(selector: &LabelSelector) -> ListParams {
    match selector.as_str() {
        Some(labels) => ListParams::default().labels(labels),
        None => ListParams::default(),
    }
}

fn require_name<K: ResourceKind>(object: &K) -> Result<&str, ApiError> {
    object.object_name().ok_or_else(|| {
        ApiError::new(
            ApiErrorKind::Invalid,
            format!("{} has no metadata.name", K::KIND),
        )
    })
}

#[async_trait]
impl<K: ResourceKind> ResourceStore<K> for KubeStore<K> {
    async fn fetch(&self, namespace: &str, name: &str) -> Result<K, ApiError> {
        self.api(namespace).get(name).await.map_err(api_error)
    }

    async fn create(&self, namespace: &str, object: &K) -> Result<K, ApiError> {
        self.api(namespace)
            .create(&PostParams::default(), object)
            .await
            .map_err(api_error)
    }

    async fn update(&self, namespace: &str, object: &K) -> Result<K, ApiError> {
        let name = require_name(object)?;
        self.api(namespace)
            .replace(name, &PostParams::default(), object)
            .await
            .map_err(api_error)
    }

    async fn patch(
        &self,
        namespace: &str,
        name: &str,
        patch: &serde_json::Value,
    ) -> Result<K, ApiError> {
        self.api(namespace)
            .patch(name, &PatchParams::default(), &Patch::Merge(patch))
            .await
            .map_err(api_error)
    }

    async fn delete(&self, namespace: &str, name: &str, cascade: bool) -> Result<(), ApiError> {
        self.api(namespace)
            .delete(name, &delete_params(cascade))
            .await
            .map(|_| ())
            .map_err(api_error)
    }

    async fn list(&self, namespace: &str, selector: &LabelSelector) -> Result<Vec<K>, ApiError> {
        self.api(namespace)
            .list(&list_params(selector))
            .await
            .map(|list| list.items)
            .map_err(api_error)
    }
}

/// Provider of instrumented kube-rs stores sharing one client and recorder.
#[derive(Clone)]
pub struct KubeStoreProvider {
    client: Client,
    recorder: Arc<dyn MetricsRecorder>,
}

impl KubeStoreProvider {
    /// Create a provider whose stores report every call to `recorder`
    pub fn new(client: Client, recorder: Arc<dyn MetricsRecorder>) -> Self {
        Self { client, recorder }
    }
}

impl StoreProvider for KubeStoreProvider {
    fn store<K: ResourceKind>(&self) -> Arc<dyn ResourceStore<K>> {
        Arc::new(Instrumented::new(
            KubeStore::<K>::new(self.client.clone()),
            self.recorder.clone(),
        ))
    }
}
