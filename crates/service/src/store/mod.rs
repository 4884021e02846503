//! Namespaced access to the remote key-value store.
//!
//! [`StoreClient`] owns a single connection handle with an explicit
//! construct → connect → use → disconnect lifecycle. Every key passed to it is
//! prefixed with the configured namespace before it reaches the backend.

pub mod memory;
pub mod remote;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use configs::StoreConfig;
use crate::errors::ServiceError;

/// Raw command surface of a connected store. Keys are already namespaced.
#[async_trait]
pub trait KvBackend: Send + Sync {
    /// `SET key value [EX ttl]`; returns the store acknowledgement.
    async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> Result<Option<String>, ServiceError>;
    async fn get(&self, key: &str) -> Result<Option<String>, ServiceError>;
    /// Removes `keys`, returning how many existed.
    async fn del(&self, keys: &[String]) -> Result<u64, ServiceError>;
    /// Glob-style key listing (`*`, `?`).
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, ServiceError>;
}

enum Connector {
    Redis { url: String },
    Shared(Arc<dyn KvBackend>),
}

/// Connection-managed client with key namespacing.
pub struct StoreClient {
    connector: Connector,
    key_prefix: String,
    conn: RwLock<Option<Arc<dyn KvBackend>>>,
}

impl StoreClient {
    /// Client for the Redis instance described by `cfg`. Not connected yet.
    pub fn new(cfg: &StoreConfig) -> Self {
        Self::from_connector(Connector::Redis { url: cfg.connection_url() }, cfg.key_prefix.clone())
    }

    /// Client over an existing backend; `connect` attaches it.
    pub fn with_backend(key_prefix: impl Into<String>, backend: Arc<dyn KvBackend>) -> Self {
        Self::from_connector(Connector::Shared(backend), key_prefix.into())
    }

    /// Client over a fresh in-process backend.
    pub fn in_memory(key_prefix: impl Into<String>) -> Self {
        Self::with_backend(key_prefix, Arc::new(memory::MemoryBackend::new()))
    }

    fn from_connector(connector: Connector, key_prefix: String) -> Self {
        Self { connector, key_prefix, conn: RwLock::new(None) }
    }

    /// Open the connection. Calling it again while connected is a no-op.
    pub async fn connect(&self) -> Result<(), ServiceError> {
        let mut slot = self.conn.write().await;
        if slot.is_some() {
            return Ok(());
        }
        let backend: Arc<dyn KvBackend> = match &self.connector {
            Connector::Redis { url } => Arc::new(remote::RedisBackend::open(url).await?),
            Connector::Shared(backend) => Arc::clone(backend),
        };
        *slot = Some(backend);
        info!(event = "store_connected", target_store = %self.describe(), prefix = %self.key_prefix, "store client connected");
        Ok(())
    }

    /// Drop the connection handle if one is open.
    pub async fn disconnect(&self) {
        if self.conn.write().await.take().is_some() {
            info!(event = "store_disconnected", target_store = %self.describe(), "store client disconnected");
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.conn.read().await.is_some()
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    pub fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    fn describe(&self) -> &str {
        match &self.connector {
            Connector::Redis { url } => url,
            Connector::Shared(_) => "shared",
        }
    }

    async fn backend(&self) -> Result<Arc<dyn KvBackend>, ServiceError> {
        self.conn.read().await.clone().ok_or(ServiceError::NotConnected)
    }

    /// Write `value` under the namespaced key. A `ttl_secs` of `None` or `0`
    /// stores the entry without expiry.
    pub async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> Result<Option<String>, ServiceError> {
        let full = self.full_key(key);
        debug!(key = %full, ?ttl_secs, "store set");
        self.backend().await?.set(&full, value, ttl_secs.filter(|t| *t > 0)).await
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, ServiceError> {
        let full = self.full_key(key);
        debug!(key = %full, "store get");
        self.backend().await?.get(&full).await
    }

    /// Remove the namespaced key; returns 0 or 1.
    pub async fn delete(&self, key: &str) -> Result<u64, ServiceError> {
        let full = self.full_key(key);
        debug!(key = %full, "store delete");
        self.backend().await?.del(std::slice::from_ref(&full)).await
    }

    /// Full stored keys matching `pattern` inside this client's prefix.
    /// The prefix is matched literally; only `pattern` is a glob.
    pub async fn keys(&self, pattern: &str) -> Result<Vec<String>, ServiceError> {
        let glob = format!("{}{}", escape_glob(&self.key_prefix), pattern);
        self.backend().await?.keys(&glob).await
    }

    /// Remove already-namespaced keys, as returned by [`StoreClient::keys`].
    pub async fn delete_many(&self, full_keys: &[String]) -> Result<u64, ServiceError> {
        if full_keys.is_empty() {
            return Ok(0);
        }
        self.backend().await?.del(full_keys).await
    }

    pub async fn delete_matching(&self, pattern: &str) -> Result<u64, ServiceError> {
        let keys = self.keys(pattern).await?;
        let removed = self.delete_many(&keys).await?;
        debug!(pattern = %self.full_key(pattern), removed, "store delete_matching");
        Ok(removed)
    }
}

/// Escape `KEYS` glob metacharacters so `literal` only matches itself.
pub fn escape_glob(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    for c in literal.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn connected(prefix: &str, backend: &Arc<memory::MemoryBackend>) -> Result<StoreClient, ServiceError> {
        let client = StoreClient::with_backend(prefix, backend.clone() as Arc<dyn KvBackend>);
        client.connect().await?;
        Ok(client)
    }

    #[tokio::test]
    async fn set_get_delete_under_prefix() -> Result<(), anyhow::Error> {
        let backend = Arc::new(memory::MemoryBackend::new());
        let client = connected("app:", &backend).await?;

        assert_eq!(client.set("k", "v", None).await?.as_deref(), Some("OK"));
        assert_eq!(client.get("k").await?.as_deref(), Some("v"));
        assert_eq!(backend.get("app:k").await?.as_deref(), Some("v"));
        assert_eq!(backend.get("k").await?, None);

        assert_eq!(client.delete("k").await?, 1);
        assert_eq!(client.delete("k").await?, 0);
        assert_eq!(client.get("k").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn changing_prefix_hides_keys() -> Result<(), anyhow::Error> {
        let backend = Arc::new(memory::MemoryBackend::new());
        let a = connected("a:", &backend).await?;
        let b = connected("b:", &backend).await?;
        let bare = connected("", &backend).await?;

        a.set("shared", "from-a", None).await?;
        assert_eq!(a.get("shared").await?.as_deref(), Some("from-a"));
        assert_eq!(b.get("shared").await?, None);
        assert_eq!(bare.get("shared").await?, None);
        assert_eq!(bare.get("a:shared").await?.as_deref(), Some("from-a"));
        assert_eq!(b.delete("shared").await?, 0);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn ttl_expires_and_zero_ttl_is_permanent() -> Result<(), anyhow::Error> {
        let client = StoreClient::in_memory("");
        client.connect().await?;

        client.set("short", "1", Some(2)).await?;
        client.set("forever", "1", Some(0)).await?;
        assert!(client.get("short").await?.is_some());

        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(client.get("short").await?, None);
        assert!(client.get("forever").await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn operations_require_connection() -> Result<(), anyhow::Error> {
        let client = StoreClient::in_memory("p:");
        assert!(!client.is_connected().await);
        assert!(matches!(client.get("k").await, Err(ServiceError::NotConnected)));

        client.connect().await?;
        client.connect().await?;
        client.set("k", "v", None).await?;

        client.disconnect().await;
        client.disconnect().await;
        assert!(matches!(client.set("k", "v", None).await, Err(ServiceError::NotConnected)));
        assert!(matches!(client.delete("k").await, Err(ServiceError::NotConnected)));

        // the in-process backend outlives the handle
        client.connect().await?;
        assert_eq!(client.get("k").await?.as_deref(), Some("v"));
        Ok(())
    }

    #[tokio::test]
    async fn disconnect_without_connect_is_noop() {
        let client = StoreClient::new(&StoreConfig::default());
        client.disconnect().await;
        assert!(!client.is_connected().await);
    }

    #[tokio::test]
    async fn delete_matching_stays_inside_prefix() -> Result<(), anyhow::Error> {
        let backend = Arc::new(memory::MemoryBackend::new());
        let mine = connected("t1:", &backend).await?;
        let other = connected("t2:", &backend).await?;

        mine.set("user:1", "a", None).await?;
        mine.set("user:2", "b", None).await?;
        mine.set("session:1", "c", None).await?;
        other.set("user:1", "d", None).await?;

        let mut keys = mine.keys("user:*").await?;
        keys.sort();
        assert_eq!(keys, vec!["t1:user:1".to_string(), "t1:user:2".to_string()]);

        assert_eq!(mine.delete_matching("user:*").await?, 2);
        assert_eq!(mine.delete_many(&[]).await?, 0);
        assert!(mine.get("session:1").await?.is_some());
        assert!(other.get("user:1").await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn glob_characters_in_prefix_match_literally() -> Result<(), anyhow::Error> {
        let backend = Arc::new(memory::MemoryBackend::new());
        let wild = connected("t?:", &backend).await?;
        let neighbour = connected("t2:", &backend).await?;
        let bracket = connected("[t]:", &backend).await?;

        neighbour.set("user:1", "precious", None).await?;
        wild.set("user:1", "mine", None).await?;
        bracket.set("user:1", "also-mine", None).await?;

        assert_eq!(wild.keys("*").await?, vec!["t?:user:1".to_string()]);
        assert_eq!(wild.delete_matching("*").await?, 1);
        assert_eq!(neighbour.get("user:1").await?.as_deref(), Some("precious"));
        assert_eq!(bracket.get("user:1").await?.as_deref(), Some("also-mine"));

        assert_eq!(bracket.delete_matching("user:*").await?, 1);
        assert_eq!(neighbour.get("user:1").await?.as_deref(), Some("precious"));
        Ok(())
    }

    #[test]
    fn escape_glob_covers_redis_metacharacters() {
        assert_eq!(escape_glob("plain:"), "plain:");
        assert_eq!(escape_glob(r"a*b?c[d]e\f"), r"a\*b\?c\[d\]e\\f");
    }

    #[tokio::test]
    async fn connect_to_unreachable_store_fails() {
        let cfg = StoreConfig { host: "127.0.0.1".into(), port: 1, ..StoreConfig::default() };
        let client = StoreClient::new(&cfg);
        assert!(matches!(client.connect().await, Err(ServiceError::Connection(_))));
        assert!(!client.is_connected().await);
    }
}
