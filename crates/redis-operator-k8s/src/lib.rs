//! Kubernetes resource services for the Redis operator
//!
//! One service per resource kind, each offering typed get, create, update,
//! delete and list operations plus [`sync::synchronize`]: fetch the live
//! object, then create it or update it under the version token just read.
//! Every call to the API server is reported through a
//! [`redis_operator_common::MetricsRecorder`].
//!
//! Controllers normally use the [`Services`] facade:
//!
//! ```ignore
//! let telemetry = init_telemetry(TelemetryConfig::from_env())?;
//! let services = redis_operator_k8s::connect(
//!     &InClusterClientProvider::new(ClientConfig::from_env()),
//!     Arc::new(telemetry.recorder()),
//! )
//! .await?;
//! services.statefulsets().create_or_update("ns-a", desired).await?;
//! ```

#![deny(missing_docs)]

pub mod classify;
pub mod client;
pub mod instrumented;
pub mod kind;
mod pod;
pub mod rbac;
pub mod selector;
pub mod service;
pub mod services;
pub mod store;
pub mod sync;
pub mod workload;

#[cfg(test)]
mod testing;

pub use client::{connect, ClientConfig, InClusterClientProvider, KubeClientProvider};
pub use kind::{ResourceKind, Scope};
pub use rbac::RbacService;
pub use selector::LabelSelector;
pub use service::KindService;
pub use services::{
    ConfigMapService, DeploymentService, PodDisruptionBudgetService, PodService,
    RedisFailoverService, SecretService, ServiceService, Services, StatefulSetService,
};
pub use store::{KubeStore, KubeStoreProvider, ResourceStore, StoreProvider};
pub use sync::{synchronize, Outcome, SyncError};
pub use workload::{PodSelector, WorkloadService};
