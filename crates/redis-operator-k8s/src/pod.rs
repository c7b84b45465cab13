//! Pod-specific operations

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Pod;
use serde_json::json;
use tracing::info;

use redis_operator_common::Result;

use crate::service::KindService;

impl KindService<Pod> {
    /// Set labels on a pod without touching the rest of the object.
    ///
    /// Sent as a merge patch, so it needs no version token and never races
    /// with the kubelet's status writes. Existing labels not named in `labels`
    /// are kept.
    pub async fn update_labels(
        &self,
        namespace: &str,
        name: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<Pod> {
        let patch = json!({ "metadata": { "labels": labels } });
        let pod = self.merge_patch(namespace, name, &patch).await?;
        info!(namespace = %namespace, pod = %name, labels = ?labels, "pod labels updated");
        Ok(pod)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use redis_operator_common::{ApiErrorKind, Verb};

    use crate::kind::ResourceKind;
    use crate::testing::{labelled, FakeStore};

    /// Story: a failover promotes redis-1-1; its role label flips to master
    /// while the labels it already had survive.
    #[tokio::test]
    async fn story_label_update_merges_into_existing_labels() {
        let store = Arc::new(FakeStore::<Pod>::new());
        store.insert(
            "ns-a",
            labelled("redis-1-1", &[("app", "redis"), ("role", "slave")]),
        );
        let pods: KindService<Pod> = KindService::new(store.clone());

        let labels = BTreeMap::from([("role".to_string(), "master".to_string())]);
        let pod = pods.update_labels("ns-a", "redis-1-1", &labels).await.unwrap();

        let stored = pod.metadata.labels.clone().unwrap();
        assert_eq!(stored.get("role").map(String::as_str), Some("master"));
        assert_eq!(stored.get("app").map(String::as_str), Some("redis"));
        assert_eq!(store.verbs(), vec![Verb::Patch]);
        assert!(pod.version_token().is_some());
    }

    #[tokio::test]
    async fn test_label_update_on_missing_pod() {
        let store = Arc::new(FakeStore::<Pod>::new());
        let pods: KindService<Pod> = KindService::new(store);

        let err = pods
            .update_labels("ns-a", "redis-1-9", &BTreeMap::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.verb(), Some(Verb::Patch));
        assert_eq!(err.api_error_kind(), Some(ApiErrorKind::NotFound));
    }
}
