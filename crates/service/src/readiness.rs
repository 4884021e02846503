//! Polling helper that waits for the store to accept commands.
//!
//! Kept outside [`StoreClient`]: the client itself never retries. Bootstrapping
//! code (tests, the CLI `ping` command) uses this to tolerate a store that is
//! still starting up.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{errors::ServiceError, store::StoreClient};

/// Namespace for probe keys; each probe writes `<prefix>__readiness__:<uuid>`.
pub const PROBE_KEY_PREFIX: &str = "__readiness__:";
pub const PROBE_VALUE: &str = "connection";

#[derive(Clone, Debug)]
pub struct ReadinessPolicy {
    max_attempts: u32,
    interval: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_millis(1000))
    }
}

impl ReadinessPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self { max_attempts, interval }
    }

    /// At least one attempt is always made.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Connect if needed, then write and read back a probe key until it matches
/// or the policy runs out of attempts.
pub async fn wait_until_ready(store: &StoreClient, policy: &ReadinessPolicy) -> Result<(), ServiceError> {
    let attempts = policy.max_attempts();
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        if attempt > 1 {
            sleep(policy.interval()).await;
        }
        match probe(store).await {
            Ok(()) => {
                info!(event = "store_ready", attempt, prefix = %store.key_prefix(), "store is ready");
                return Ok(());
            }
            Err(e) => {
                debug!(event = "store_not_ready", attempt, max_attempts = attempts, error = %e, "store probe failed");
                last_error = e.to_string();
            }
        }
    }

    Err(ServiceError::Unavailable { attempts, last_error })
}

async fn probe(store: &StoreClient) -> Result<(), ServiceError> {
    if !store.is_connected().await {
        store.connect().await?;
    }
    let key = format!("{PROBE_KEY_PREFIX}{}", Uuid::new_v4());
    // short expiry so a probe interrupted before its delete cleans itself up
    store.set(&key, PROBE_VALUE, Some(60)).await?;
    match store.get(&key).await?.as_deref() {
        Some(PROBE_VALUE) => {
            store.delete(&key).await?;
            Ok(())
        }
        other => Err(ServiceError::Operation(format!("probe read back {other:?}"))),
    }
}
