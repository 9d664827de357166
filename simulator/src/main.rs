mod reading;

use std::env;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use reading::Reading;
use tracing::{error, info, warn};

const LOCATIONS: &[&str] = &[
    "north-yard",
    "south-yard",
    "rooftop",
    "loading-bay",
    "cold-room",
];

#[tokio::main]
async fn main() {
    let api_url = env::var("API_URL")
        .unwrap_or_else(|_| "http://localhost:8080/api/sensors/data".to_string());
    let interval_ms: u64 = env::var("INTERVAL_MS")
        .unwrap_or_else(|_| "5000".to_string())
        .parse()
        .unwrap_or(5000);
    let num_devices: usize = env::var("DEVICES")
        .unwrap_or_else(|_| "5".to_string())
        .parse()
        .unwrap_or(5);

    // Initialize logging
    tracing_subscriber::fmt::init();

    info!("Starting sensor simulator");
    info!(
        "API: {}, Interval: {}ms, Devices: {}",
        api_url, interval_ms, num_devices
    );

    let client = reqwest::Client::new();
    let interval = Duration::from_millis(interval_ms);

    let mut handles = Vec::new();
    for device in 0..num_devices {
        let client = client.clone();
        let api_url = api_url.clone();
        let device_id = format!("sensor-{:03}", device + 1);
        handles.push(tokio::spawn(async move {
            run_device(client, api_url, device_id, interval).await;
        }));
    }

    for handle in handles {
        let _ = handle.await;
    }
}

async fn run_device(
    client: reqwest::Client,
    api_url: String,
    device_id: String,
    interval: Duration,
) {
    let mut sent = 0u64;

    loop {
        let reading = generate_reading(&mut rand::thread_rng(), &device_id);

        match client.post(&api_url).json(&reading).send().await {
            Ok(response) if response.status() == reqwest::StatusCode::ACCEPTED => {
                sent += 1;
                let request_id = response
                    .json::<serde_json::Value>()
                    .await
                    .ok()
                    .and_then(|ack| ack["request_id"].as_str().map(str::to_string))
                    .unwrap_or_else(|| "unknown".to_string());
                info!(
                    "{}: accepted ({} sent), request_id {}",
                    device_id, sent, request_id
                );
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                warn!("{}: rejected with {}: {}", device_id, status, body);
            }
            Err(e) => {
                error!("{}: request failed: {}", device_id, e);
            }
        }

        tokio::time::sleep(interval).await;
    }
}

fn generate_reading(rng: &mut impl Rng, device_id: &str) -> Reading {
    let temperature = if rng.gen_bool(0.05) {
        rng.gen_range(150.1..200.0) // 5% outliers, rejected by the API
    } else {
        rng.gen_range(18.0..28.0) // Normal range
    };

    let humidity = if rng.gen_bool(0.05) {
        rng.gen_range(100.1..130.0) // 5% outliers
    } else {
        rng.gen_range(30.0..70.0) // Normal range
    };

    let location = LOCATIONS[rng.gen_range(0..LOCATIONS.len())].to_string();

    Reading {
        device_id: device_id.to_string(),
        temperature,
        humidity,
        timestamp: Utc::now(),
        location,
    }
}
