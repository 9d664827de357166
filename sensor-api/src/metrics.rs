use lazy_static::lazy_static;
use prometheus::{Counter, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref READINGS_RECEIVED_TOTAL: Counter = Counter::with_opts(Opts::new(
        "sensor_api_readings_received_total",
        "Total readings received over HTTP"
    ))
    .unwrap();
    pub static ref READINGS_REJECTED_TOTAL: Counter = Counter::with_opts(Opts::new(
        "sensor_api_readings_rejected_total",
        "Total readings rejected by validation"
    ))
    .unwrap();
    pub static ref READINGS_PERSISTED_TOTAL: Counter = Counter::with_opts(Opts::new(
        "sensor_api_readings_persisted_total",
        "Total readings written to storage"
    ))
    .unwrap();
    pub static ref PERSIST_FAILURES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "sensor_api_persist_failures_total",
        "Total storage append failures, each one a dropped reading"
    ))
    .unwrap();
    pub static ref PERSIST_LATENCY_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "sensor_api_persist_latency_seconds",
            "Time taken to append one reading to storage"
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0
        ])
    )
    .unwrap();
    pub static ref QUEUE_DEPTH: Gauge = Gauge::with_opts(Opts::new(
        "sensor_api_queue_depth",
        "Readings waiting in the write queue"
    ))
    .unwrap();
    pub static ref QUEUE_FULL_TOTAL: Counter = Counter::with_opts(Opts::new(
        "sensor_api_queue_full_total",
        "Total number of times the write queue was full (backpressure events)"
    ))
    .unwrap();
}

pub fn init_metrics() {
    REGISTRY
        .register(Box::new(READINGS_RECEIVED_TOTAL.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(READINGS_REJECTED_TOTAL.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(READINGS_PERSISTED_TOTAL.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(PERSIST_FAILURES_TOTAL.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(PERSIST_LATENCY_SECONDS.clone()))
        .unwrap();
    REGISTRY.register(Box::new(QUEUE_DEPTH.clone())).unwrap();
    REGISTRY
        .register(Box::new(QUEUE_FULL_TOTAL.clone()))
        .unwrap();
}

pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}
