//! Workload services: StatefulSets and Deployments and the pods they own

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::core::v1::Pod;

use redis_operator_common::{Error, Result};

use crate::kind::ResourceKind;
use crate::selector::LabelSelector;
use crate::service::KindService;
use crate::sync::{Outcome, SyncError};

/// A workload kind whose pods are found through `spec.selector.matchLabels`.
pub trait PodSelector: ResourceKind {
    /// The workload's `matchLabels`, if it declares any
    fn match_labels(&self) -> Option<&BTreeMap<String, String>>;
}

impl PodSelector for StatefulSet {
    fn match_labels(&self) -> Option<&BTreeMap<String, String>> {
        self.spec.as_ref()?.selector.match_labels.as_ref()
    }
}

impl PodSelector for Deployment {
    fn match_labels(&self) -> Option<&BTreeMap<String, String>> {
        self.spec.as_ref()?.selector.match_labels.as_ref()
    }
}

/// Operations on a workload kind, plus lookup of the pods it selects.
pub struct WorkloadService<K: PodSelector> {
    workloads: KindService<K>,
    pods: KindService<Pod>,
}

impl<K: PodSelector> WorkloadService<K> {
    /// Create a service; `pods` is used to resolve the workload's pods
    pub fn new(workloads: KindService<K>, pods: KindService<Pod>) -> Self {
        Self { workloads, pods }
    }

    /// Fetch the live workload
    pub async fn get(&self, namespace: &str, name: &str) -> Result<K> {
        self.workloads.get(namespace, name).await
    }

    /// Create a new workload
    pub async fn create(&self, namespace: &str, object: &K) -> Result<K> {
        self.workloads.create(namespace, object).await
    }

    /// Replace an existing workload
    pub async fn update(&self, namespace: &str, object: &K) -> Result<K> {
        self.workloads.update(namespace, object).await
    }

    /// Create the workload, or update it under the live version token
    pub async fn create_or_update(
        &self,
        namespace: &str,
        desired: K,
    ) -> std::result::Result<Outcome, SyncError> {
        self.workloads.create_or_update(namespace, desired).await
    }

    /// Delete the workload; its pods are removed first
    pub async fn delete(&self, namespace: &str, name: &str) -> Result<()> {
        self.workloads.delete(namespace, name).await
    }

    /// List workloads in the namespace
    pub async fn list(&self, namespace: &str) -> Result<Vec<K>> {
        self.workloads.list(namespace).await
    }

    /// Pods selected by the named workload's `matchLabels`.
    ///
    /// A workload without `matchLabels` is rejected rather than treated as
    /// selecting every pod in the namespace.
    pub async fn pods(&self, namespace: &str, name: &str) -> Result<Vec<Pod>> {
        let workload = self.workloads.get(namespace, name).await?;
        let labels = workload
            .match_labels()
            .filter(|labels| !labels.is_empty())
            .ok_or_else(|| {
                Error::validation(
                    K::KIND,
                    format!("{namespace}/{name} has no spec.selector.matchLabels"),
                )
            })?;
        self.pods
            .list_matching(namespace, &LabelSelector::from_match_labels(labels))
            .await
    }
}
