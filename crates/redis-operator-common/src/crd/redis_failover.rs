//! RedisFailover CRD describing a Redis master/replica set watched by Sentinels
//!
//! Only the shape of the resource lives here; what the operator does with it
//! is the controller's concern.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Kind name of the RedisFailover resource
pub const REDIS_FAILOVER_KIND: &str = "RedisFailover";

const DEFAULT_REDIS_IMAGE: &str = "redis:7.2-alpine";
const DEFAULT_REDIS_REPLICAS: i32 = 3;
const DEFAULT_REDIS_PORT: i32 = 6379;
const DEFAULT_SENTINEL_REPLICAS: i32 = 3;

/// RedisFailover declares a Redis deployment with Sentinel-based failover.
///
/// Example:
/// ```yaml
/// apiVersion: databases.spotahome.com/v1
/// kind: RedisFailover
/// metadata:
///   name: cache
/// spec:
///   redis:
///     replicas: 3
///   sentinel:
///     replicas: 3
///   auth:
///     secretPath: redis-auth
/// ```
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "databases.spotahome.com",
    version = "v1",
    kind = "RedisFailover",
    plural = "redisfailovers",
    shortname = "rf",
    namespaced,
    printcolumn = r#"{"name":"Redis","type":"integer","jsonPath":".spec.redis.replicas"}"#,
    printcolumn = r#"{"name":"Sentinels","type":"integer","jsonPath":".spec.sentinel.replicas"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct RedisFailoverSpec {
    /// Redis server settings
    #[serde(default)]
    pub redis: RedisSettings,

    /// Sentinel settings
    #[serde(default)]
    pub sentinel: SentinelSettings,

    /// Authentication settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthSettings>,

    /// Labels from the RedisFailover that are propagated to generated objects.
    /// Empty means all labels are propagated.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub label_whitelist: Vec<String>,
}

/// Redis server settings
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RedisSettings {
    /// Container image
    #[serde(default = "default_redis_image")]
    pub image: String,

    /// Number of Redis pods (one master, the rest replicas)
    #[serde(default = "default_redis_replicas")]
    pub replicas: i32,

    /// Port Redis listens on
    #[serde(default = "default_redis_port")]
    pub port: i32,

    /// Extra `redis.conf` directives, one per entry
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_config: Vec<String>,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            image: default_redis_image(),
            replicas: DEFAULT_REDIS_REPLICAS,
            port: DEFAULT_REDIS_PORT,
            custom_config: Vec::new(),
        }
    }
}

/// Sentinel settings
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SentinelSettings {
    /// Container image
    #[serde(default = "default_redis_image")]
    pub image: String,

    /// Number of Sentinel pods
    #[serde(default = "default_sentinel_replicas")]
    pub replicas: i32,

    /// Extra `sentinel.conf` directives, one per entry
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_config: Vec<String>,
}

impl Default for SentinelSettings {
    fn default() -> Self {
        Self {
            image: default_redis_image(),
            replicas: DEFAULT_SENTINEL_REPLICAS,
            custom_config: Vec::new(),
        }
    }
}

/// Authentication settings
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthSettings {
    /// Name of the Secret holding the `password` key
    pub secret_path: String,
}

fn default_redis_image() -> String {
    DEFAULT_REDIS_IMAGE.to_string()
}

fn default_redis_replicas() -> i32 {
    DEFAULT_REDIS_REPLICAS
}

fn default_redis_port() -> i32 {
    DEFAULT_REDIS_PORT
}

fn default_sentinel_replicas() -> i32 {
    DEFAULT_SENTINEL_REPLICAS
}
