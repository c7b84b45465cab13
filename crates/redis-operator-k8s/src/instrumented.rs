//! Metrics decorator for resource stores

use std::sync::Arc;

use async_trait::async_trait;

use redis_operator_common::{ApiError, MetricsRecorder, Verb, NOT_APPLICABLE};

use crate::kind::ResourceKind;
use crate::selector::LabelSelector;
use crate::store::ResourceStore;

/// Wraps a [`ResourceStore`] and reports every call it forwards.
///
/// Exactly one metric is recorded per call, after the inner store returns,
/// whether the call succeeded or not.
pub struct Instrumented<S> {
    inner: S,
    recorder: Arc<dyn MetricsRecorder>,
}

impl<S> Instrumented<S> {
    /// Decorate `inner`, reporting to `recorder`
    pub fn new(inner: S, recorder: Arc<dyn MetricsRecorder>) -> Self {
        Self { inner, recorder }
    }

    fn record<T>(
        &self,
        namespace: &str,
        kind: &str,
        object: &str,
        verb: Verb,
        result: &Result<T, ApiError>,
    ) {
        let error = result.as_ref().err().map(|e| e.kind);
        self.recorder
            .record_k8s_operation(namespace, kind, object, verb, error);
    }
}

#[async_trait]
impl<K, S> ResourceStore<K> for Instrumented<S>
where
    K: ResourceKind,
    S: ResourceStore<K>,
{
    async fn fetch(&self, namespace: &str, name: &str) -> Result<K, ApiError> {
        let result = self.inner.fetch(namespace, name).await;
        self.record(namespace, K::KIND, name, Verb::Get, &result);
        result
    }

    async fn create(&self, namespace: &str, object: &K) -> Result<K, ApiError> {
        let result = self.inner.create(namespace, object).await;
        let name = object.object_name().unwrap_or_default();
        self.record(namespace, K::KIND, name, Verb::Create, &result);
        result
    }

    async fn update(&self, namespace: &str, object: &K) -> Result<K, ApiError> {
        let result = self.inner.update(namespace, object).await;
        let name = object.object_name().unwrap_or_default();
        self.record(namespace, K::KIND, name, Verb::Update, &result);
        result
    }

    async fn patch(
        &self,
        namespace: &str,
        name: &str,
        patch: &serde_json::Value,
    ) -> Result<K, ApiError> {
        let result = self.inner.patch(namespace, name, patch).await;
        self.record(namespace, K::KIND, name, Verb::Patch, &result);
        result
    }

    async fn delete(&self, namespace: &str, name: &str, cascade: bool) -> Result<(), ApiError> {
        let result = self.inner.delete(namespace, name, cascade).await;
        self.record(namespace, K::KIND, name, Verb::Delete, &result);
        result
    }

    async fn list(&self, namespace: &str, selector: &LabelSelector) -> Result<Vec<K>, ApiError> {
        let result = self.inner.list(namespace, selector).await;
        self.record(namespace, K::KIND, NOT_APPLICABLE, Verb::List, &result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::apps::v1::StatefulSet;
    use k8s_openapi::api::core::v1::ConfigMap;
    use mockall::predicate::eq;
    use redis_operator_common::ApiErrorKind;

    use crate::testing::{named, FakeStore};

    mockall::mock! {
        Recorder {}
        impl MetricsRecorder for Recorder {
            fn record_k8s_operation(
                &self,
                namespace: &str,
                kind: &str,
                object: &str,
                verb: Verb,
                error: Option<ApiErrorKind>,
            );
        }
    }

    #[tokio::test]
    async fn test_successful_fetch_is_recorded_once() {
        let fake = FakeStore::<StatefulSet>::new();
        fake.insert("ns-a", named("redis-1"));

        let mut recorder = MockRecorder::new();
        recorder
            .expect_record_k8s_operation()
            .with(
                eq("ns-a"),
                eq("StatefulSet"),
                eq("redis-1"),
                eq(Verb::Get),
                eq(None::<ApiErrorKind>),
            )
            .times(1)
            .return_const(());

        let store = Instrumented::new(fake, Arc::new(recorder));
        let fetched: StatefulSet = store.fetch("ns-a", "redis-1").await.unwrap();
        assert_eq!(fetched.object_name(), Some("redis-1"));
    }

    #[tokio::test]
    async fn test_failure_is_recorded_with_error_kind() {
        let fake = FakeStore::<ConfigMap>::new();
        fake.fail_on(Verb::Create, ApiErrorKind::Forbidden);

        let mut recorder = MockRecorder::new();
        recorder
            .expect_record_k8s_operation()
            .with(
                eq("ns-a"),
                eq("ConfigMap"),
                eq("sentinel-config"),
                eq(Verb::Create),
                eq(Some(ApiErrorKind::Forbidden)),
            )
            .times(1)
            .return_const(());

        let store = Instrumented::new(fake, Arc::new(recorder));
        let err = store
            .create("ns-a", &named::<ConfigMap>("sentinel-config"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_missing_object_fetch_is_recorded_as_failure() {
        let mut recorder = MockRecorder::new();
        recorder
            .expect_record_k8s_operation()
            .with(
                eq("ns-a"),
                eq("ConfigMap"),
                eq("absent"),
                eq(Verb::Get),
                eq(Some(ApiErrorKind::NotFound)),
            )
            .times(1)
            .return_const(());

        let store = Instrumented::new(FakeStore::<ConfigMap>::new(), Arc::new(recorder));
        let err = store.fetch("ns-a", "absent").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_records_not_applicable_object() {
        let mut recorder = MockRecorder::new();
        recorder
            .expect_record_k8s_operation()
            .with(
                eq("ns-a"),
                eq("ConfigMap"),
                eq(NOT_APPLICABLE),
                eq(Verb::List),
                eq(None::<ApiErrorKind>),
            )
            .times(1)
            .return_const(());

        let store = Instrumented::new(FakeStore::<ConfigMap>::new(), Arc::new(recorder));
        let items = store
            .list("ns-a", &LabelSelector::everything())
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_delete_and_patch_use_their_own_verbs() {
        let fake = FakeStore::<ConfigMap>::new();
        fake.insert("ns-a", named("redis-config"));

        let mut recorder = MockRecorder::new();
        recorder
            .expect_record_k8s_operation()
            .with(
                eq("ns-a"),
                eq("ConfigMap"),
                eq("redis-config"),
                eq(Verb::Patch),
                eq(None::<ApiErrorKind>),
            )
            .times(1)
            .return_const(());
        recorder
            .expect_record_k8s_operation()
            .with(
                eq("ns-a"),
                eq("ConfigMap"),
                eq("redis-config"),
                eq(Verb::Delete),
                eq(None::<ApiErrorKind>),
            )
            .times(1)
            .return_const(());

        let store = Instrumented::new(fake, Arc::new(recorder));
        let patch = serde_json::json!({"metadata": {"labels": {"tier": "cache"}}});
        store.patch("ns-a", "redis-config", &patch).await.unwrap();
        store.delete("ns-a", "redis-config", true).await.unwrap();
    }
}
