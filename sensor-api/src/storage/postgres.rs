use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use super::ReadingStore;
use crate::errors::StorageError;
use crate::model::StoredReading;
use crate::validate::ValidReading;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS readings (
    id BIGSERIAL PRIMARY KEY,
    device_id TEXT NOT NULL,
    temperature DOUBLE PRECISION NOT NULL,
    humidity DOUBLE PRECISION NOT NULL,
    ts TIMESTAMPTZ NOT NULL,
    created_at TIMESTAMPTZ NOT NULL
)
"#;

const INDEX: &str =
    "CREATE INDEX IF NOT EXISTS readings_device_ts_idx ON readings (device_id, ts DESC)";

/// Postgres-backed store. Ids come from the `readings` sequence, so
/// assignment is serialized by the database.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connects and makes sure the schema exists. The DDL is idempotent, so
    /// several instances can start against the same database.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        info!("Connecting to database...");
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await?;

        info!("Database connection established");
        sqlx::query(SCHEMA).execute(&pool).await?;
        sqlx::query(INDEX).execute(&pool).await?;
        info!("Schema ready");

        Ok(Self { pool })
    }
}

#[async_trait]
impl ReadingStore for PgStore {
    async fn append(&self, reading: ValidReading) -> Result<StoredReading, StorageError> {
        let reading = reading.into_inner();
        let stored = sqlx::query_as::<_, StoredReading>(
            r#"
            INSERT INTO readings (device_id, temperature, humidity, ts, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, device_id, temperature, humidity, ts AS timestamp, created_at
            "#,
        )
        .bind(&reading.device_id)
        .bind(reading.temperature)
        .bind(reading.humidity)
        .bind(reading.timestamp)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }

    async fn query_latest(
        &self,
        device_id: &str,
        limit: u32,
    ) -> Result<Vec<StoredReading>, StorageError> {
        let rows = sqlx::query_as::<_, StoredReading>(
            r#"
            SELECT id, device_id, temperature, humidity, ts AS timestamp, created_at
            FROM readings
            WHERE device_id = $1
            ORDER BY ts DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(device_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
