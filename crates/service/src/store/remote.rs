use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::RedisError;
use tracing::{error, info};

use super::KvBackend;
use crate::errors::ServiceError;

/// Redis backend over one multiplexed connection.
///
/// The connection is cloned per command; clones share the same socket and the
/// driver pipelines their requests in order.
///
/// Errors are observed only when a command returns them: a socket that dies
/// while idle is not logged until the next command fails on it.
#[derive(Clone)]
pub struct RedisBackend {
    conn: MultiplexedConnection,
}

impl RedisBackend {
    pub async fn open(url: &str) -> Result<Self, ServiceError> {
        let client = redis::Client::open(url).map_err(|e| ServiceError::Connection(e.to_string()))?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|e| {
                error!(event = "store_connect_failed", %url, error = %e, "cannot connect to store");
                ServiceError::Connection(e.to_string())
            })?;
        info!(event = "store_socket_open", %url, "store connection established");
        Ok(Self { conn })
    }

    // Error observer: connection-level failures are logged and surfaced, never retried.
    fn observe(op: &'static str, e: RedisError) -> ServiceError {
        if e.is_connection_dropped() || e.is_connection_refusal() || e.is_io_error() || e.is_timeout() {
            error!(event = "store_connection_error", op, error = %e, "store connection error");
        } else {
            error!(event = "store_command_failed", op, error = %e, "store command failed");
        }
        ServiceError::Operation(e.to_string())
    }
}

#[async_trait]
impl KvBackend for RedisBackend {
    async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> Result<Option<String>, ServiceError> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl_secs {
            cmd.arg("EX").arg(ttl);
        }
        let reply: Option<String> = cmd.query_async(&mut conn).await.map_err(|e| Self::observe("set", e))?;
        Ok(reply)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, ServiceError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| Self::observe("get", e))?;
        Ok(value)
    }

    async fn del(&self, keys: &[String]) -> Result<u64, ServiceError> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("DEL");
        for key in keys {
            cmd.arg(key.as_str());
        }
        let removed: u64 = cmd.query_async(&mut conn).await.map_err(|e| Self::observe("del", e))?;
        Ok(removed)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, ServiceError> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = redis::cmd("KEYS")
            .arg(pattern)
            .query_async(&mut conn)
            .await
            .map_err(|e| Self::observe("keys", e))?;
        Ok(keys)
    }
}
