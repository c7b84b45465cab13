//! Facade bundling every per-kind service

use std::sync::Arc;

use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{ConfigMap, Pod, Secret, Service};
use k8s_openapi::api::policy::v1::PodDisruptionBudget;
use kube::Client;

use redis_operator_common::crd::RedisFailover;
use redis_operator_common::MetricsRecorder;

use crate::rbac::RbacService;
use crate::service::KindService;
use crate::store::{KubeStoreProvider, StoreProvider};
use crate::workload::WorkloadService;

/// ConfigMap operations
pub type ConfigMapService = KindService<ConfigMap>;
/// Secret operations
pub type SecretService = KindService<Secret>;
/// Pod operations
pub type PodService = KindService<Pod>;
/// PodDisruptionBudget operations
pub type PodDisruptionBudgetService = KindService<PodDisruptionBudget>;
/// Service operations
pub type ServiceService = KindService<Service>;
/// RedisFailover operations
pub type RedisFailoverService = KindService<RedisFailover>;
/// StatefulSet operations
pub type StatefulSetService = WorkloadService<StatefulSet>;
/// Deployment operations
pub type DeploymentService = WorkloadService<Deployment>;

/// Every service the controller uses, wired to one set of stores.
pub struct Services {
    config_maps: ConfigMapService,
    secrets: SecretService,
    pods: PodService,
    pod_disruption_budgets: PodDisruptionBudgetService,
    redis_failovers: RedisFailoverService,
    services: ServiceService,
    rbac: RbacService,
    deployments: DeploymentService,
    statefulsets: StatefulSetService,
}

impl Services {
    /// Build every service from stores handed out by `provider`.
    ///
    /// The workload services resolve pods through the same store as
    /// [`Services::pods`].
    pub fn new(provider: &impl StoreProvider) -> Self {
        let pods = KindService::new(provider.store::<Pod>());
        Self {
            config_maps: KindService::new(provider.store()),
            secrets: KindService::new(provider.store()),
            pod_disruption_budgets: KindService::new(provider.store()),
            redis_failovers: KindService::new(provider.store()),
            services: KindService::new(provider.store()),
            rbac: RbacService::new(
                KindService::new(provider.store()),
                KindService::new(provider.store()),
                KindService::new(provider.store()),
            ),
            deployments: WorkloadService::new(
                KindService::new(provider.store::<Deployment>()),
                pods.clone(),
            ),
            statefulsets: WorkloadService::new(
                KindService::new(provider.store::<StatefulSet>()),
                pods.clone(),
            ),
            pods,
        }
    }

    /// Build every service against the API server, reporting each call to
    /// `recorder`.
    pub fn from_client(client: Client, recorder: Arc<dyn MetricsRecorder>) -> Self {
        Self::new(&KubeStoreProvider::new(client, recorder))
    }

    /// ConfigMap operations
    pub fn config_maps(&self) -> &ConfigMapService {
        &self.config_maps
    }

    /// Secret operations
    pub fn secrets(&self) -> &SecretService {
        &self.secrets
    }

    /// Pod operations
    pub fn pods(&self) -> &PodService {
        &self.pods
    }

    /// PodDisruptionBudget operations
    pub fn pod_disruption_budgets(&self) -> &PodDisruptionBudgetService {
        &self.pod_disruption_budgets
    }

    /// RedisFailover operations
    pub fn redis_failovers(&self) -> &RedisFailoverService {
        &self.redis_failovers
    }

    /// Service operations
    pub fn services(&self) -> &ServiceService {
        &self.services
    }

    /// Role, RoleBinding and ClusterRole operations
    pub fn rbac(&self) -> &RbacService {
        &self.rbac
    }

    /// Deployment operations
    pub fn deployments(&self) -> &DeploymentService {
        &self.deployments
    }

    /// StatefulSet operations
    pub fn statefulsets(&self) -> &StatefulSetService {
        &self.statefulsets
    }
}
