use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::ReadingStore;
use crate::errors::StorageError;
use crate::model::StoredReading;
use crate::validate::ValidReading;

/// In-memory store for tests and local runs.
///
/// Appends go through one lock, so ids are unique and follow insertion
/// order, same as the database sequence. The `set_fail_*` switches inject
/// failures for exercising the error paths.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_appends: AtomicBool,
    fail_queries: AtomicBool,
    append_attempts: AtomicU64,
}

#[derive(Default)]
struct Inner {
    rows: Vec<StoredReading>,
    next_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent appends fail until switched off again.
    pub fn set_fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent queries fail until switched off again.
    pub fn set_fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// Appends attempted so far, failed ones included.
    pub fn append_attempts(&self) -> u64 {
        self.append_attempts.load(Ordering::SeqCst)
    }

    /// Readings held, across all devices.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ReadingStore for MemoryStore {
    async fn append(&self, reading: ValidReading) -> Result<StoredReading, StorageError> {
        self.append_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(
                "append failure injected".to_string(),
            ));
        }

        let reading = reading.into_inner();
        let mut inner = self.inner.lock().await;
        inner.next_id += 1;
        let stored = StoredReading {
            id: inner.next_id,
            device_id: reading.device_id,
            temperature: reading.temperature,
            humidity: reading.humidity,
            timestamp: reading.timestamp,
            created_at: Utc::now(),
        };
        inner.rows.push(stored.clone());
        Ok(stored)
    }

    async fn query_latest(
        &self,
        device_id: &str,
        limit: u32,
    ) -> Result<Vec<StoredReading>, StorageError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(
                "query failure injected".to_string(),
            ));
        }

        let inner = self.inner.lock().await;
        let mut rows: Vec<StoredReading> = inner
            .rows
            .iter()
            .filter(|r| r.device_id == device_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        rows.truncate(limit as usize);
        Ok(rows)
    }
}
