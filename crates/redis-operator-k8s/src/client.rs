//! Kubernetes client construction
//!
//! Client creation sits behind [`KubeClientProvider`] so code that wires the
//! services can be tested without a cluster.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use redis_operator_common::MetricsRecorder;

use crate::services::Services;

/// Default connection timeout for kube clients
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default read timeout for kube clients
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

const CONNECT_TIMEOUT_ENV: &str = "REDIS_OPERATOR_KUBE_CONNECT_TIMEOUT_SECS";
const READ_TIMEOUT_ENV: &str = "REDIS_OPERATOR_KUBE_READ_TIMEOUT_SECS";

/// Timeouts applied to every request the operator sends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// Time allowed to establish a connection to the API server
    pub connect_timeout: Duration,
    /// Time allowed for a response once connected
    pub read_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Read timeouts from the environment, falling back to defaults.
    ///
    /// Values are whole seconds. Unparseable or zero values are ignored with
    /// a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            connect_timeout: seconds(&lookup, CONNECT_TIMEOUT_ENV)
                .unwrap_or(defaults.connect_timeout),
            read_timeout: seconds(&lookup, READ_TIMEOUT_ENV).unwrap_or(defaults.read_timeout),
        }
    }
}

fn seconds(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
        _ => {
            warn!(variable = key, value = %raw, "ignoring invalid timeout");
            None
        }
    }
}

/// Trait for creating Kubernetes clients
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait KubeClientProvider: Send + Sync {
    /// Create a new Kubernetes client
    async fn create(&self) -> Result<kube::Client, kube::Error>;
}

/// Creates clients from in-cluster config, or the local kubeconfig when run
/// outside a cluster
#[derive(Clone, Debug, Default)]
pub struct InClusterClientProvider {
    config: ClientConfig,
}

impl InClusterClientProvider {
    /// Provider applying `config` to every client it creates
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

#[async_trait::async_trait]
impl KubeClientProvider for InClusterClientProvider {
    async fn create(&self) -> Result<kube::Client, kube::Error> {
        let mut config = kube::Config::infer()
            .await
            .map_err(kube::Error::InferConfig)?;
        config.connect_timeout = Some(self.config.connect_timeout);
        config.read_timeout = Some(self.config.read_timeout);
        kube::Client::try_from(config)
    }
}

/// Create a client and wire every service to it.
pub async fn connect(
    provider: &dyn KubeClientProvider,
    recorder: Arc<dyn MetricsRecorder>,
) -> Result<Services, kube::Error> {
    let client = provider.create().await.map_err(|e| {
        warn!(error = %e, "failed to create Kubernetes client");
        e
    })?;
    info!(namespace = %client.default_namespace(), "connected to Kubernetes API server");
    Ok(Services::from_client(client, recorder))
}
