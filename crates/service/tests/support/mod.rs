//! Harness for tests that talk to a live store.
//!
//! Opt-in: set `STORE_TESTS=1` and point `REDIS_HOST`/`REDIS_PORT` at a
//! running instance (port defaults to 6380). Each harness isolates its keys
//! under a unique prefix and removes them on `close`.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use configs::StoreConfig;
use service::readiness::{wait_until_ready, ReadinessPolicy};
use service::store::StoreClient;
use service::user_service::UserService;

pub struct TestHarness {
    pub store: Arc<StoreClient>,
    pub users: UserService,
    pub key_prefix: String,
}

pub fn live_store_enabled() -> bool {
    std::env::var("STORE_TESTS").is_ok()
}

pub fn live_config(key_prefix: &str) -> StoreConfig {
    let mut cfg = StoreConfig { port: 6380, ..StoreConfig::default() };
    cfg.normalize_from_env();
    cfg.key_prefix = key_prefix.to_string();
    cfg
}

/// Connect to the live store under a fresh prefix; `None` when live tests are disabled.
pub async fn setting_test() -> anyhow::Result<Option<TestHarness>> {
    if !live_store_enabled() {
        eprintln!("STORE_TESTS not set; skipping live store test");
        return Ok(None);
    }
    common::utils::logging::init_logging_test();

    let key_prefix = format!("it:{}:", uuid::Uuid::new_v4());
    let store = Arc::new(StoreClient::new(&live_config(&key_prefix)));
    wait_until_ready(&store, &ReadinessPolicy::new(5, Duration::from_millis(1000))).await?;

    let users = UserService::new(store.clone());
    Ok(Some(TestHarness { store, users, key_prefix }))
}

impl TestHarness {
    /// Remove keys matching `pattern` under this harness' prefix.
    pub async fn clean_by_pattern(&self, pattern: &str) -> anyhow::Result<u64> {
        Ok(self.store.delete_matching(pattern).await?)
    }

    pub async fn close(self) -> anyhow::Result<()> {
        let cleaned = self.clean_by_pattern("*").await;
        self.store.disconnect().await;
        cleaned.map(|_| ())
    }
}
