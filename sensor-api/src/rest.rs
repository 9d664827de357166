use std::sync::Arc;

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{error, warn};

use crate::config::Config;
use crate::errors::{StorageError, ValidationError};
use crate::metrics::{
    self, QUEUE_DEPTH, QUEUE_FULL_TOTAL, READINGS_RECEIVED_TOTAL, READINGS_REJECTED_TOTAL,
};
use crate::model::{DeviceReadings, HealthStatus, IngestAck, NewReading, ReadingResponse};
use crate::storage::ReadingStore;
use crate::validate::{validate, ValidReading};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ReadingStore>,
    pub tx: mpsc::Sender<ValidReading>,
    pub config: Arc<Config>,
}

#[derive(Debug, Deserialize)]
pub struct ReadingsQuery {
    limit: Option<u32>,
}

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/sensors/data", post(ingest_reading))
        .route("/sensors/data/:device_id", get(get_device_readings));

    Router::new()
        .nest(&state.config.api_prefix, api)
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Accepts one reading. The reading is validated synchronously and queued
/// for the writer pool; the 202 means "accepted", not "persisted".
async fn ingest_reading(
    State(state): State<AppState>,
    payload: Result<Json<NewReading>, JsonRejection>,
) -> Result<(StatusCode, Json<IngestAck>), ApiError> {
    READINGS_RECEIVED_TOTAL.inc();

    let Json(candidate) = payload.map_err(|rejection| {
        READINGS_REJECTED_TOTAL.inc();
        ApiError::MalformedInput(rejection.body_text())
    })?;

    let reading = validate(candidate, &state.config.bounds).map_err(|e| {
        READINGS_REJECTED_TOTAL.inc();
        ApiError::Validation(e)
    })?;

    enqueue(&state.tx, reading).await?;

    Ok((StatusCode::ACCEPTED, Json(IngestAck::new())))
}

async fn enqueue(tx: &mpsc::Sender<ValidReading>, reading: ValidReading) -> Result<(), ApiError> {
    match tx.try_send(reading) {
        Ok(()) => {
            QUEUE_DEPTH.inc();
            Ok(())
        }
        Err(TrySendError::Full(reading)) => {
            QUEUE_FULL_TOTAL.inc();
            warn!("Write queue full, waiting for room");
            tx.send(reading).await.map_err(|_| ApiError::QueueClosed)?;
            QUEUE_DEPTH.inc();
            Ok(())
        }
        Err(TrySendError::Closed(_)) => {
            error!("Write queue closed, cannot accept readings");
            Err(ApiError::QueueClosed)
        }
    }
}

/// Returns the latest readings for one device, newest first. An unknown
/// device is an empty list.
async fn get_device_readings(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    params: Result<Query<ReadingsQuery>, QueryRejection>,
) -> Result<Json<DeviceReadings>, ApiError> {
    let Query(params) =
        params.map_err(|rejection| ApiError::InvalidParameter(rejection.body_text()))?;

    let limit = params.limit.unwrap_or(state.config.default_limit);
    if limit <= 1 || limit > state.config.max_limit {
        return Err(ApiError::InvalidParameter(format!(
            "limit must be greater than 1 and at most {}, got {}",
            state.config.max_limit, limit
        )));
    }

    let readings = state.store.query_latest(&device_id, limit).await?;

    Ok(Json(DeviceReadings {
        device_id,
        readings: readings.into_iter().map(ReadingResponse::from).collect(),
    }))
}

/// Liveness only. Never touches storage, so it stays green while the
/// database is down.
async fn health() -> Json<HealthStatus> {
    Json(HealthStatus::current())
}

async fn metrics_handler() -> String {
    metrics::gather_metrics()
}

/// Application error type.
#[derive(Debug)]
pub enum ApiError {
    MalformedInput(String),
    Validation(ValidationError),
    InvalidParameter(String),
    Storage(StorageError),
    QueueClosed,
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        ApiError::Storage(e)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::MalformedInput(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody {
                    error: msg,
                    field: None,
                },
            ),
            ApiError::Validation(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody {
                    field: Some(e.field()),
                    error: e.to_string(),
                },
            ),
            ApiError::InvalidParameter(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody {
                    error: msg,
                    field: Some("limit"),
                },
            ),
            ApiError::Storage(e) => {
                error!("Storage error on query: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: e.to_string(),
                        field: None,
                    },
                )
            }
            ApiError::QueueClosed => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorBody {
                    error: "ingestion queue closed".to_string(),
                    field: None,
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}
