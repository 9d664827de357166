//! HTTP ingestion and retrieval service for environmental sensor readings.
//!
//! Devices POST readings; the handler validates them against configured
//! bounds and hands them to a background writer pool over a bounded queue,
//! acknowledging with 202 before anything touches the database. Reads go
//! straight to storage.
//!
//! # REST API Endpoints
//!
//! - `POST /api/sensors/data` - Submit one reading (202 on accept)
//! - `GET /api/sensors/data/:device_id` - Latest readings, newest first
//! - `GET /health` - Liveness check, independent of storage
//! - `GET /metrics` - Prometheus metrics

pub mod config;
pub mod errors;
pub mod metrics;
pub mod model;
pub mod rest;
pub mod storage;
pub mod validate;
pub mod writer;

pub use config::{Bounds, Config};
pub use rest::{create_router, AppState};
pub use storage::{MemoryStore, PgStore, ReadingStore};
