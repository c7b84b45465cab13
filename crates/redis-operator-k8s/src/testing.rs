//! In-memory store for tests
//!
//! Behaves like the API server for the parts the services rely on: version
//! tokens are assigned on every write, stale tokens conflict, creating an
//! existing name fails, and every call is logged for later assertions.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use redis_operator_common::{ApiError, ApiErrorKind, Verb};

use crate::kind::{ResourceKind, Scope};
use crate::selector::LabelSelector;
use crate::store::{ResourceStore, StoreProvider};

/// One call received by a [`FakeStore`]
#[derive(Debug, Clone)]
pub(crate) struct Call<K> {
    pub verb: Verb,
    pub namespace: String,
    pub name: String,
    /// Object passed to create or update
    pub object: Option<K>,
    pub cascade: bool,
}

struct State<K> {
    objects: BTreeMap<(String, String), K>,
    calls: Vec<Call<K>>,
    failures: HashMap<Verb, ApiErrorKind>,
    next_version: u64,
}

pub(crate) struct FakeStore<K> {
    state: Mutex<State<K>>,
}

/// Build an object of kind `K` with only a name set
pub(crate) fn named<K: ResourceKind + Default>(name: &str) -> K {
    let mut object = K::default();
    object.meta_mut().name = Some(name.to_string());
    object
}

/// Build a named object carrying `labels`
pub(crate) fn labelled<K: ResourceKind + Default>(name: &str, labels: &[(&str, &str)]) -> K {
    let mut object: K = named(name);
    object.meta_mut().labels = Some(
        labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    );
    object
}

impl<K: ResourceKind> FakeStore<K> {
    pub fn new() -> Self {
        Self::with_first_version(1)
    }

    /// Start assigning version tokens at `first`
    pub fn with_first_version(first: u64) -> Self {
        Self {
            state: Mutex::new(State {
                objects: BTreeMap::new(),
                calls: Vec::new(),
                failures: HashMap::new(),
                next_version: first,
            }),
        }
    }

    /// Seed an object without logging a call. A token is assigned.
    pub fn insert(&self, namespace: &str, mut object: K) -> K {
        let mut state = self.state.lock();
        let token = state.bump();
        object.set_version_token(Some(token));
        let name = object.object_name().unwrap_or_default().to_string();
        state
            .objects
            .insert((scoped::<K>(namespace), name), object.clone());
        object
    }

    /// Make every call with `verb` fail with `kind`
    pub fn fail_on(&self, verb: Verb, kind: ApiErrorKind) {
        self.state.lock().failures.insert(verb, kind);
    }

    /// Stored copy of an object
    pub fn get(&self, namespace: &str, name: &str) -> Option<K> {
        self.state
            .lock()
            .objects
            .get(&(scoped::<K>(namespace), name.to_string()))
            .cloned()
    }

    pub fn calls(&self) -> Vec<Call<K>> {
        self.state.lock().calls.clone()
    }

    pub fn verbs(&self) -> Vec<Verb> {
        self.state.lock().calls.iter().map(|c| c.verb).collect()
    }
}

impl<K> State<K> {
    fn bump(&mut self) -> String {
        let token = self.next_version.to_string();
        self.next_version += 1;
        token
    }
}

impl<K: ResourceKind> State<K> {
    fn begin(
        &mut self,
        verb: Verb,
        namespace: &str,
        name: &str,
        object: Option<&K>,
        cascade: bool,
    ) -> Result<(), ApiError> {
        self.calls.push(Call {
            verb,
            namespace: namespace.to_string(),
            name: name.to_string(),
            object: object.cloned(),
            cascade,
        });
        match self.failures.get(&verb) {
            Some(kind) => Err(ApiError::new(*kind, format!("injected {verb} failure"))),
            None => Ok(()),
        }
    }
}

fn scoped<K: ResourceKind>(namespace: &str) -> String {
    match K::SCOPE {
        Scope::Namespaced => namespace.to_string(),
        Scope::Cluster => String::new(),
    }
}

fn not_found<K: ResourceKind>(name: &str) -> ApiError {
    ApiError::not_found(format!("{} \"{name}\" not found", K::KIND))
}

fn matches(selector: &LabelSelector, labels: Option<&BTreeMap<String, String>>) -> bool {
    let Some(wanted) = selector.as_str() else {
        return true;
    };
    wanted.split(',').all(|pair| match pair.split_once('=') {
        Some((key, value)) => labels
            .and_then(|l| l.get(key))
            .is_some_and(|v| v == value),
        None => false,
    })
}

fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(fields) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(serde_json::Map::new());
    }
    if let Value::Object(existing) = target {
        for (key, value) in fields {
            if value.is_null() {
                existing.remove(key);
            } else {
                merge_patch(existing.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    }
}

#[async_trait]
impl<K: ResourceKind> ResourceStore<K> for FakeStore<K> {
    async fn fetch(&self, namespace: &str, name: &str) -> Result<K, ApiError> {
        let mut state = self.state.lock();
        state.begin(Verb::Get, namespace, name, None, false)?;
        state
            .objects
            .get(&(scoped::<K>(namespace), name.to_string()))
            .cloned()
            .ok_or_else(|| not_found::<K>(name))
    }

    async fn create(&self, namespace: &str, object: &K) -> Result<K, ApiError> {
        let name = object.object_name().unwrap_or_default().to_string();
        let mut state = self.state.lock();
        state.begin(Verb::Create, namespace, &name, Some(object), false)?;
        if name.is_empty() {
            return Err(ApiError::new(ApiErrorKind::Invalid, "name is required"));
        }
        if object.version_token().is_some() {
            return Err(ApiError::new(
                ApiErrorKind::Invalid,
                "resourceVersion should not be set on objects to be created",
            ));
        }
        let key = (scoped::<K>(namespace), name.clone());
        if state.objects.contains_key(&key) {
            return Err(ApiError::new(
                ApiErrorKind::AlreadyExists,
                format!("{} \"{name}\" already exists", K::KIND),
            ));
        }
        let mut stored = object.clone();
        stored.set_version_token(Some(state.bump()));
        state.objects.insert(key, stored.clone());
        Ok(stored)
    }

    async fn update(&self, namespace: &str, object: &K) -> Result<K, ApiError> {
        let name = object.object_name().unwrap_or_default().to_string();
        let mut state = self.state.lock();
        state.begin(Verb::Update, namespace, &name, Some(object), false)?;
        let key = (scoped::<K>(namespace), name.clone());
        let current = state
            .objects
            .get(&key)
            .and_then(|o| o.version_token().map(str::to_string));
        let Some(current) = current else {
            return Err(not_found::<K>(&name));
        };
        if let Some(token) = object.version_token() {
            if token != current {
                return Err(ApiError::new(
                    ApiErrorKind::Conflict,
                    "the object has been modified; please apply your changes to the latest version",
                ));
            }
        }
        let mut stored = object.clone();
        stored.set_version_token(Some(state.bump()));
        state.objects.insert(key, stored.clone());
        Ok(stored)
    }

    async fn patch(&self, namespace: &str, name: &str, patch: &Value) -> Result<K, ApiError> {
        let mut state = self.state.lock();
        state.begin(Verb::Patch, namespace, name, None, false)?;
        let key = (scoped::<K>(namespace), name.to_string());
        let current = state
            .objects
            .get(&key)
            .ok_or_else(|| not_found::<K>(name))?;
        let invalid = |e: serde_json::Error| ApiError::new(ApiErrorKind::Invalid, e.to_string());
        let mut document = serde_json::to_value(current).map_err(invalid)?;
        merge_patch(&mut document, patch);
        let mut patched: K = serde_json::from_value(document).map_err(invalid)?;
        patched.set_version_token(Some(state.bump()));
        state.objects.insert(key, patched.clone());
        Ok(patched)
    }

    async fn delete(&self, namespace: &str, name: &str, cascade: bool) -> Result<(), ApiError> {
        let mut state = self.state.lock();
        state.begin(Verb::Delete, namespace, name, None, cascade)?;
        state
            .objects
            .remove(&(scoped::<K>(namespace), name.to_string()))
            .map(|_| ())
            .ok_or_else(|| not_found::<K>(name))
    }

    async fn list(&self, namespace: &str, selector: &LabelSelector) -> Result<Vec<K>, ApiError> {
        let mut state = self.state.lock();
        state.begin(
            Verb::List,
            namespace,
            redis_operator_common::NOT_APPLICABLE,
            None,
            false,
        )?;
        let namespace = scoped::<K>(namespace);
        Ok(state
            .objects
            .iter()
            .filter(|((ns, _), object)| {
                *ns == namespace && matches(selector, object.meta().labels.as_ref())
            })
            .map(|(_, object)| object.clone())
            .collect())
    }
}

/// Provider handing out a fresh empty [`FakeStore`] per kind
pub(crate) struct FakeProvider;

impl StoreProvider for FakeProvider {
    fn store<K: ResourceKind>(&self) -> Arc<dyn ResourceStore<K>> {
        Arc::new(FakeStore::<K>::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::Pod;

    #[tokio::test]
    async fn test_stale_token_conflicts() {
        let store = FakeStore::<Pod>::with_first_version(10);
        let mut stored = store.insert("ns-a", named("redis-0"));
        assert_eq!(stored.version_token(), Some("10"));

        stored.set_version_token(Some("9".to_string()));
        let err = store.update("ns-a", &stored).await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_list_filters_by_namespace_and_labels() {
        let store = FakeStore::<Pod>::new();
        store.insert("ns-a", labelled("redis-0", &[("app", "redis")]));
        store.insert("ns-a", labelled("other", &[("app", "web")]));
        store.insert("ns-b", labelled("redis-0", &[("app", "redis")]));

        let selector = LabelSelector::from_match_labels(&BTreeMap::from([(
            "app".to_string(),
            "redis".to_string(),
        )]));
        let pods = store.list("ns-a", &selector).await.unwrap();
        assert_eq!(pods.len(), 1);
        assert_eq!(pods[0].object_name(), Some("redis-0"));
    }

    #[test]
    fn test_merge_patch_removes_nulls_and_merges_objects() {
        let mut doc = serde_json::json!({"a": {"b": 1, "c": 2}, "d": 3});
        merge_patch(&mut doc, &serde_json::json!({"a": {"b": null, "e": 4}}));
        assert_eq!(doc, serde_json::json!({"a": {"c": 2, "e": 4}, "d": 3}));
    }
}
