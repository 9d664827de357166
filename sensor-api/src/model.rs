use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Acknowledgement message returned on successful ingestion.
pub const ACK_MESSAGE: &str = "Data received and being processed";

/// A sensor reading as submitted by a device. `timestamp` is the device's
/// own measurement time and is stored as given; an offset-less timestamp is
/// read as UTC. Unknown JSON fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReading {
    pub device_id: String,
    pub temperature: f64,
    pub humidity: f64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// Devices in the field report ISO-8601 times both with and without an
/// offset. Offset-bearing strings are normalized to UTC; offset-less ones
/// are taken to already be UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(with_offset.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>()
        .map(|naive| naive.and_utc())
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp {:?}: {}", raw, e)))
}

/// A reading after persistence. `id` reflects insertion order across all
/// devices; `created_at` is the server-side receipt time, distinct from the
/// device's `timestamp`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StoredReading {
    pub id: i64,
    pub device_id: String,
    pub temperature: f64,
    pub humidity: f64,
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Reading shape returned by the retrieval endpoint. `created_at` stays
/// internal.
#[derive(Debug, Serialize)]
pub struct ReadingResponse {
    pub id: i64,
    pub device_id: String,
    pub temperature: f64,
    pub humidity: f64,
    pub timestamp: DateTime<Utc>,
}

impl From<StoredReading> for ReadingResponse {
    fn from(r: StoredReading) -> Self {
        Self {
            id: r.id,
            device_id: r.device_id,
            temperature: r.temperature,
            humidity: r.humidity,
            timestamp: r.timestamp,
        }
    }
}

/// Retrieval response wrapper.
#[derive(Debug, Serialize)]
pub struct DeviceReadings {
    pub device_id: String,
    pub readings: Vec<ReadingResponse>,
}

/// Body of the 202 response. Every accepted request gets a fresh
/// `request_id`, whether or not the reading later survives persistence.
#[derive(Debug, Serialize)]
pub struct IngestAck {
    pub message: &'static str,
    pub request_id: Uuid,
}

impl IngestAck {
    pub fn new() -> Self {
        Self {
            message: ACK_MESSAGE,
            request_id: Uuid::new_v4(),
        }
    }
}

impl Default for IngestAck {
    fn default() -> Self {
        Self::new()
    }
}

/// Body of the health endpoint. Built without touching storage so the
/// endpoint stays up when the database is down.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
}

impl HealthStatus {
    pub fn current() -> Self {
        Self {
            status: "healthy",
            version: env!("CARGO_PKG_VERSION"),
            timestamp: Utc::now(),
        }
    }
}
