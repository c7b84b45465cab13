//! Resource kind descriptors
//!
//! Every kind the operator manages is listed once in the table at the bottom of
//! this module. The table fixes the kind name used in logs, metrics and errors,
//! and whether the kind lives in a namespace or at cluster scope.

use std::fmt::Debug;

use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{ConfigMap, Pod, Secret, Service};
use k8s_openapi::api::policy::v1::PodDisruptionBudget;
use k8s_openapi::api::rbac::v1::{ClusterRole, Role, RoleBinding};
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;

use redis_operator_common::crd::{RedisFailover, REDIS_FAILOVER_KIND};

/// Whether objects of a kind are addressed by namespace and name, or by name alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Identified by (namespace, name)
    Namespaced,
    /// Identified by name; the namespace argument is ignored
    Cluster,
}

/// A Kubernetes object type the operator can synchronize.
pub trait ResourceKind:
    Resource<DynamicType = ()> + Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Kind name (e.g. "StatefulSet")
    const KIND: &'static str;

    /// Namespace or cluster scope
    const SCOPE: Scope;

    /// Build an API handle for this kind in the given namespace.
    fn api(client: Client, namespace: &str) -> Api<Self>;

    /// The object's name, if it has one
    fn object_name(&self) -> Option<&str> {
        self.meta().name.as_deref()
    }

    /// The version token assigned by the API server on the last write
    fn version_token(&self) -> Option<&str> {
        self.meta().resource_version.as_deref()
    }

    /// Replace the version token
    fn set_version_token(&mut self, token: Option<String>) {
        self.meta_mut().resource_version = token;
    }
}

/// Implement [`ResourceKind`] for each `Type => "Kind", scope;` row.
macro_rules! resource_kinds {
    (@scope namespaced) => { Scope::Namespaced };
    (@scope cluster) => { Scope::Cluster };
    (@api namespaced, $client:ident, $namespace:ident) => { Api::namespaced($client, $namespace) };
    (@api cluster, $client:ident, $namespace:ident) => {{
        let _ = $namespace;
        Api::all($client)
    }};
    ($($ty:ty => $kind:expr, $scope:ident;)*) => {
        $(
            impl ResourceKind for $ty {
                const KIND: &'static str = $kind;
                const SCOPE: Scope = resource_kinds!(@scope $scope);

                fn api(client: Client, namespace: &str) -> Api<Self> {
                    resource_kinds!(@api $scope, client, namespace)
                }
            }
        )*
    };
}

resource_kinds! {
    ConfigMap => "ConfigMap", namespaced;
    Secret => "Secret", namespaced;
    Pod => "Pod", namespaced;
    PodDisruptionBudget => "PodDisruptionBudget", namespaced;
    StatefulSet => "StatefulSet", namespaced;
    Deployment => "Deployment", namespaced;
    Service => "Service", namespaced;
    Role => "Role", namespaced;
    RoleBinding => "RoleBinding", namespaced;
    ClusterRole => "ClusterRole", cluster;
    RedisFailover => REDIS_FAILOVER_KIND, namespaced;
}
