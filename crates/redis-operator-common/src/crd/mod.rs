//! Custom Resource Definitions for the Redis operator

mod redis_failover;

pub use redis_failover::{
    AuthSettings, RedisFailover, RedisFailoverSpec, RedisSettings, SentinelSettings,
    REDIS_FAILOVER_KIND,
};
