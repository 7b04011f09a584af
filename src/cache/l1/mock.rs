//! In-memory exact store backends for tests and examples.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::{ExactCacheError, ExactCacheResult};
use super::store::ExactStore;

/// Process-local exact store with per-entry expiry.
#[derive(Default)]
pub struct MemoryExactStore {
    entries: Mutex<HashMap<String, (Instant, Vec<u8>)>>,
}

impl MemoryExactStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .values()
            .filter(|(expires, _)| *expires > now)
            .count()
    }

    /// Whether no live entries exist.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ExactStore for MemoryExactStore {
    async fn get(&self, key: &str) -> ExactCacheResult<Option<Vec<u8>>> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some((expires, value)) if *expires > Instant::now() => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> ExactCacheResult<()> {
        self.entries
            .lock()
            .insert(key.to_string(), (Instant::now() + ttl, value.to_vec()));
        Ok(())
    }
}

/// Store that fails every operation, for degradation tests.
#[derive(Default)]
pub struct FailingExactStore;

#[async_trait]
impl ExactStore for FailingExactStore {
    async fn get(&self, _key: &str) -> ExactCacheResult<Option<Vec<u8>>> {
        Err(ExactCacheError::InvalidConfig {
            reason: "store unreachable".to_string(),
        })
    }

    async fn set(&self, _key: &str, _value: &[u8], _ttl: Duration) -> ExactCacheResult<()> {
        Err(ExactCacheError::InvalidConfig {
            reason: "store unreachable".to_string(),
        })
    }
}
