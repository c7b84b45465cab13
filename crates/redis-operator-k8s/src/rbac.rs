//! RBAC objects granting the Redis and Sentinel pods their permissions

use k8s_openapi::api::rbac::v1::{ClusterRole, Role, RoleBinding};

use redis_operator_common::Result;

use crate::service::KindService;
use crate::sync::{Outcome, SyncError};

/// Operations on Roles, RoleBindings and ClusterRoles.
///
/// ClusterRoles are read-only here: the operator binds to ones installed with
/// it but never writes them.
#[derive(Clone)]
pub struct RbacService {
    roles: KindService<Role>,
    role_bindings: KindService<RoleBinding>,
    cluster_roles: KindService<ClusterRole>,
}

impl RbacService {
    /// Create a service from per-kind services
    pub fn new(
        roles: KindService<Role>,
        role_bindings: KindService<RoleBinding>,
        cluster_roles: KindService<ClusterRole>,
    ) -> Self {
        Self {
            roles,
            role_bindings,
            cluster_roles,
        }
    }

    /// Fetch a ClusterRole by name
    pub async fn get_cluster_role(&self, name: &str) -> Result<ClusterRole> {
        self.cluster_roles.get("", name).await
    }

    /// Fetch a Role
    pub async fn get_role(&self, namespace: &str, name: &str) -> Result<Role> {
        self.roles.get(namespace, name).await
    }

    /// Create a Role
    pub async fn create_role(&self, namespace: &str, role: &Role) -> Result<Role> {
        self.roles.create(namespace, role).await
    }

    /// Replace a Role
    pub async fn update_role(&self, namespace: &str, role: &Role) -> Result<Role> {
        self.roles.update(namespace, role).await
    }

    /// Create the Role, or update it under the live version token
    pub async fn create_or_update_role(
        &self,
        namespace: &str,
        role: Role,
    ) -> std::result::Result<Outcome, SyncError> {
        self.roles.create_or_update(namespace, role).await
    }

    /// Delete a Role
    pub async fn delete_role(&self, namespace: &str, name: &str) -> Result<()> {
        self.roles.delete(namespace, name).await
    }

    /// List Roles in the namespace
    pub async fn list_roles(&self, namespace: &str) -> Result<Vec<Role>> {
        self.roles.list(namespace).await
    }

    /// Fetch a RoleBinding
    pub async fn get_role_binding(&self, namespace: &str, name: &str) -> Result<RoleBinding> {
        self.role_bindings.get(namespace, name).await
    }

    /// Create a RoleBinding
    pub async fn create_role_binding(
        &self,
        namespace: &str,
        binding: &RoleBinding,
    ) -> Result<RoleBinding> {
        self.role_bindings.create(namespace, binding).await
    }

    /// Replace a RoleBinding. Its roleRef must be unchanged.
    pub async fn update_role_binding(
        &self,
        namespace: &str,
        binding: &RoleBinding,
    ) -> Result<RoleBinding> {
        self.role_bindings.update(namespace, binding).await
    }

    /// Create the RoleBinding, or bring the live one in line with `binding`.
    ///
    /// roleRef is immutable once written, so a binding pointing at a
    /// different role is deleted and created again. The outcome is then
    /// [`Outcome::Created`].
    pub async fn create_or_update_role_binding(
        &self,
        namespace: &str,
        binding: RoleBinding,
    ) -> std::result::Result<Outcome, SyncError> {
        self.role_bindings
            .create_or_replace(namespace, binding, |stored, desired| {
                stored.role_ref != desired.role_ref
            })
            .await
    }

    /// Delete a RoleBinding
    pub async fn delete_role_binding(&self, namespace: &str, name: &str) -> Result<()> {
        self.role_bindings.delete(namespace, name).await
    }

    /// List RoleBindings in the namespace
    pub async fn list_role_bindings(&self, namespace: &str) -> Result<Vec<RoleBinding>> {
        self.role_bindings.list(namespace).await
    }
}
