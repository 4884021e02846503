//! In-process backend with the same command semantics as the remote store.
//! Used by unit tests and anywhere a throwaway store is enough.

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::{Duration, Instant};

use super::KvBackend;
use crate::errors::ServiceError;

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

#[derive(Default)]
pub struct MemoryBackend {
    entries: DashMap<String, Entry>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.is_live(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KvBackend for MemoryBackend {
    async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> Result<Option<String>, ServiceError> {
        let expires_at = ttl_secs.map(|t| Instant::now() + Duration::from_secs(t));
        self.entries.insert(key.to_string(), Entry { value: value.to_string(), expires_at });
        Ok(Some("OK".to_string()))
    }

    async fn get(&self, key: &str) -> Result<Option<String>, ServiceError> {
        let now = Instant::now();
        match self.entries.get(key) {
            None => return Ok(None),
            Some(entry) if entry.is_live(now) => return Ok(Some(entry.value.clone())),
            Some(_) => {}
        }
        self.entries.remove_if(key, |_, e| !e.is_live(now));
        Ok(None)
    }

    async fn del(&self, keys: &[String]) -> Result<u64, ServiceError> {
        let now = Instant::now();
        let removed = keys
            .iter()
            .filter_map(|k| self.entries.remove(k))
            .filter(|(_, e)| e.is_live(now))
            .count();
        Ok(removed as u64)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, ServiceError> {
        let now = Instant::now();
        let pattern: Vec<char> = pattern.chars().collect();
        Ok(self
            .entries
            .iter()
            .filter(|e| e.is_live(now))
            .filter(|e| glob_match(&pattern, &e.key().chars().collect::<Vec<_>>()))
            .map(|e| e.key().clone())
            .collect())
    }
}

/// Redis `KEYS` glob subset: `*`, `?` and `\` escapes.
fn glob_match(pattern: &[char], text: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some((&'*', rest)) => (0..=text.len()).any(|skip| glob_match(rest, &text[skip..])),
        Some((&'?', rest)) => !text.is_empty() && glob_match(rest, &text[1..]),
        Some((&'\\', rest)) if !rest.is_empty() => {
            text.first() == rest.first() && glob_match(&rest[1..], &text[1..])
        }
        Some((c, rest)) => text.first() == Some(c) && glob_match(rest, &text[1..]),
    }
}
