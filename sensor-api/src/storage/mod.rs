use async_trait::async_trait;

use crate::errors::StorageError;
use crate::model::StoredReading;
use crate::validate::ValidReading;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Durable home for readings.
///
/// `append` assigns the reading its id; ids reflect insertion order across
/// all devices, so two appends never share one. `query_latest` returns up to
/// `limit` readings for one device, newest first by device timestamp. An
/// unknown device is an empty result, not an error.
#[async_trait]
pub trait ReadingStore: Send + Sync {
    async fn append(&self, reading: ValidReading) -> Result<StoredReading, StorageError>;

    async fn query_latest(
        &self,
        device_id: &str,
        limit: u32,
    ) -> Result<Vec<StoredReading>, StorageError>;
}
