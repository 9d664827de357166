use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::metrics::{
    PERSIST_FAILURES_TOTAL, PERSIST_LATENCY_SECONDS, QUEUE_DEPTH, READINGS_PERSISTED_TOTAL,
};
use crate::storage::ReadingStore;
use crate::validate::ValidReading;

/// Spawns the writer pool and returns a handle that resolves once every
/// worker has stopped.
///
/// Each worker takes one reading at a time from the shared queue and appends
/// it to storage. A failed append is logged and counted and the reading is
/// dropped; the worker keeps going. Workers exit when all senders are gone
/// and the queue has drained.
pub fn spawn_writers(
    rx: mpsc::Receiver<ValidReading>,
    store: Arc<dyn ReadingStore>,
    workers: usize,
) -> JoinHandle<()> {
    info!("Starting {} writer workers", workers);

    let rx = Arc::new(Mutex::new(rx));
    let handles: Vec<JoinHandle<()>> = (0..workers)
        .map(|worker| {
            let rx = Arc::clone(&rx);
            let store = Arc::clone(&store);
            tokio::spawn(run_writer(worker, rx, store))
        })
        .collect();

    tokio::spawn(async move {
        for handle in handles {
            let _ = handle.await;
        }
        info!("All writer workers stopped");
    })
}

async fn run_writer(
    worker: usize,
    rx: Arc<Mutex<mpsc::Receiver<ValidReading>>>,
    store: Arc<dyn ReadingStore>,
) {
    debug!("Writer {} started", worker);

    loop {
        // The lock is held only while waiting on the queue; appends from
        // different workers run concurrently.
        let reading = rx.lock().await.recv().await;
        let Some(reading) = reading else {
            break;
        };
        QUEUE_DEPTH.dec();

        persist_one(worker, store.as_ref(), reading).await;
    }

    debug!("Writer {} stopped", worker);
}

async fn persist_one(worker: usize, store: &dyn ReadingStore, reading: ValidReading) {
    let device_id = reading.device_id.clone();
    let start = Instant::now();

    match store.append(reading).await {
        Ok(stored) => {
            let elapsed = start.elapsed().as_secs_f64();
            READINGS_PERSISTED_TOTAL.inc();
            PERSIST_LATENCY_SECONDS.observe(elapsed);
            debug!(
                "Writer {} persisted reading {} for {} in {:.3}s",
                worker, stored.id, stored.device_id, elapsed
            );
        }
        Err(e) => {
            PERSIST_FAILURES_TOTAL.inc();
            error!(
                "Writer {} failed to persist reading for {}: {}. Reading dropped",
                worker, device_id, e
            );
        }
    }
}
