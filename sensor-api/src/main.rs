use std::sync::Arc;

use anyhow::Context;
use axum::http::HeaderValue;
use tokio::sync::mpsc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use sensor_api::config::Config;
use sensor_api::rest::{self, AppState};
use sensor_api::storage::{PgStore, ReadingStore};
use sensor_api::{metrics, writer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    // Initialize logging
    tracing_subscriber::fmt::init();

    info!("Starting sensor API");
    info!("HTTP server: {}", config.http_addr);
    info!(
        "Database: {}",
        config.database_url.split('@').last().unwrap_or("***")
    );

    // Initialize metrics
    metrics::init_metrics();

    // Connect to database
    let store = match PgStore::connect(&config.database_url).await {
        Ok(store) => Arc::new(store) as Arc<dyn ReadingStore>,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    // Create bounded queue between the handlers and the writer pool
    info!(
        "Queue capacity: {}, writer workers: {}",
        config.queue_capacity, config.writer_workers
    );
    let (tx, rx) = mpsc::channel(config.queue_capacity);

    let writer_handle = writer::spawn_writers(rx, Arc::clone(&store), config.writer_workers);

    let cors = cors_layer(&config.cors_origins);
    let state = AppState {
        store,
        tx,
        config: Arc::new(config.clone()),
    };

    let app = rest::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start HTTP server
    let listener = tokio::net::TcpListener::bind(&config.http_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.http_addr))?;

    info!("HTTP server listening on {}", config.http_addr);

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap_or_else(|e| {
            error!("HTTP server error: {}", e);
        });
    });

    tokio::select! {
        _ = writer_handle => {
            error!("Writer pool terminated");
        }
        _ = server_handle => {
            error!("HTTP server terminated");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("Shutting down");
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
