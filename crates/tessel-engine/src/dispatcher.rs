//! Keyed sighting dispatcher.
//!
//! Sightings are routed to one of N worker tasks by hashing their cell key,
//! so all sightings of one cell are processed in order by the same worker
//! while different cells proceed in parallel. Each worker drains a bounded
//! queue; a full queue applies backpressure to the caller.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Mutex, RwLock};
use tokio::task::JoinHandle;

use tessel_types::cell::{CellKey, RawCellLocation};

use crate::engine::{Engine, SightingOutcome};
use crate::normalizer::SightingNormalizer;
use crate::{EngineError, Result};

/// Default number of workers.
pub const DEFAULT_WORKERS: usize = 4;

/// Default queue capacity per worker.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Work item sent to a shard.
struct Job {
    ticket: u64,
    key: CellKey,
    reply: Option<oneshot::Sender<Result<SightingOutcome>>>,
}

pub struct SightingDispatcher {
    normalizer: SightingNormalizer,
    engine: Arc<Engine>,
    shards: RwLock<Vec<mpsc::Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl SightingDispatcher {
    /// Spawn the workers. Must be called inside a tokio runtime.
    pub fn new(
        engine: Arc<Engine>,
        normalizer: SightingNormalizer,
        workers: usize,
        queue_capacity: usize,
    ) -> Self {
        let workers = workers.max(1);
        let queue_capacity = queue_capacity.max(1);

        let mut shards = Vec::with_capacity(workers);
        let mut handles = Vec::with_capacity(workers);
        for index in 0..workers {
            let (tx, rx) = mpsc::channel(queue_capacity);
            shards.push(tx);
            handles.push(tokio::spawn(shard_worker(index, rx, engine.clone())));
        }
        tracing::debug!(workers, queue_capacity, "sighting dispatcher started");

        Self {
            normalizer,
            engine,
            shards: RwLock::new(shards),
            workers: Mutex::new(handles),
        }
    }

    pub fn normalizer(&self) -> &SightingNormalizer {
        &self.normalizer
    }

    /// Queue a raw reading without waiting for it to be processed.
    ///
    /// Returns the sighting's ticket, or `None` if the reading carried no
    /// signal and was dropped.
    pub async fn dispatch(&self, raw: &RawCellLocation) -> Result<Option<u64>> {
        let Some(key) = self.normalizer.normalize(raw) else {
            return Ok(None);
        };
        let ticket = self.engine.next_ticket();
        self.enqueue(Job {
            ticket,
            key,
            reply: None,
        })
        .await?;
        Ok(Some(ticket))
    }

    /// Queue a raw reading and wait for its outcome.
    pub async fn dispatch_and_wait(&self, raw: &RawCellLocation) -> Result<Option<SightingOutcome>> {
        let Some(key) = self.normalizer.normalize(raw) else {
            return Ok(None);
        };
        let (reply_tx, reply_rx) = oneshot::channel();
        let ticket = self.engine.next_ticket();
        self.enqueue(Job {
            ticket,
            key,
            reply: Some(reply_tx),
        })
        .await?;

        let outcome = reply_rx.await.map_err(|_| EngineError::DispatcherClosed)??;
        Ok(Some(outcome))
    }

    async fn enqueue(&self, job: Job) -> Result<()> {
        let sender = {
            let shards = self.shards.read().await;
            if shards.is_empty() {
                return Err(EngineError::DispatcherClosed);
            }
            let index = shard_for(&job.key, shards.len());
            shards[index].clone()
        };
        sender
            .send(job)
            .await
            .map_err(|_| EngineError::DispatcherClosed)
    }

    /// Close the queues and wait for queued sightings to drain.
    pub async fn shutdown(&self) {
        self.shards.write().await.clear();
        let handles: Vec<_> = self.workers.lock().await.drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "sighting worker failed");
            }
        }
        tracing::debug!("sighting dispatcher stopped");
    }
}

fn shard_for(key: &CellKey, shards: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    // Truncation is fine, the value is only used modulo the shard count.
    (hasher.finish() as usize) % shards
}

async fn shard_worker(index: usize, mut rx: mpsc::Receiver<Job>, engine: Arc<Engine>) {
    while let Some(job) = rx.recv().await {
        let result = engine.process_sighting(job.ticket, job.key).await;
        if let Err(e) = &result {
            tracing::warn!(worker = index, cell = %job.key, error = %e, "sighting dropped");
        }
        if let Some(reply) = job.reply {
            let _ = reply.send(result);
        }
    }
    tracing::debug!(worker = index, "sighting worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applier::tests::{RecordingIndicator, RecordingSink};
    use crate::applier::ProfileApplier;
    use crate::clock::ManualClock;
    use crate::resolver::Labels;
    use tessel_db::queries::{cell_log, cells};
    use tessel_types::cell::NetworkType;

    fn dispatcher(workers: usize) -> (SightingDispatcher, Arc<Engine>) {
        let conn = tessel_db::open_memory().expect("db");
        let engine = Arc::new(Engine::new(
            Arc::new(Mutex::new(conn)),
            Arc::new(ManualClock::new(1_000)),
            ProfileApplier::new(
                Arc::new(RecordingSink::default()),
                Arc::new(RecordingIndicator::default()),
            ),
            Labels::default(),
        ));
        let dispatcher = SightingDispatcher::new(
            engine.clone(),
            SightingNormalizer::new(NetworkType::Gsm),
            workers,
            8,
        );
        (dispatcher, engine)
    }

    #[test]
    fn test_same_key_same_shard() {
        let key = CellKey::new(42, NetworkType::Gsm);
        assert_eq!(shard_for(&key, 4), shard_for(&key, 4));
        assert_eq!(shard_for(&key, 1), 0);
    }

    #[tokio::test]
    async fn test_no_signal_never_reaches_storage() {
        let (dispatcher, engine) = dispatcher(2);
        let ticket = dispatcher
            .dispatch(&RawCellLocation::no_signal())
            .await
            .expect("dispatch");
        assert_eq!(ticket, None);
        dispatcher.shutdown().await;

        let conn = engine.db().lock().await;
        assert_eq!(cell_log::count(&conn).expect("count"), 0);
        assert_eq!(engine.state().current_cell(), None);
    }

    #[tokio::test]
    async fn test_dispatch_and_wait_returns_outcome() {
        let (dispatcher, _engine) = dispatcher(2);
        let outcome = dispatcher
            .dispatch_and_wait(&RawCellLocation::gsm(42))
            .await
            .expect("dispatch")
            .expect("signal");
        assert!(outcome.created);
        assert_eq!(outcome.key, CellKey::new(42, NetworkType::Gsm));
        dispatcher.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sightings_create_one_row() {
        let (dispatcher, engine) = dispatcher(4);
        for _ in 0..50 {
            dispatcher
                .dispatch(&RawCellLocation::gsm(7))
                .await
                .expect("dispatch");
            dispatcher
                .dispatch(&RawCellLocation::gsm(8))
                .await
                .expect("dispatch");
        }
        dispatcher.shutdown().await;

        let conn = engine.db().lock().await;
        for cell_id in [7, 8] {
            let rows = cells::count_for_key(&conn, CellKey::new(cell_id, NetworkType::Gsm))
                .expect("count");
            assert_eq!(rows, 1);
        }
        assert_eq!(cell_log::count(&conn).expect("count"), 100);
    }

    #[tokio::test]
    async fn test_dispatch_after_shutdown_fails() {
        let (dispatcher, _engine) = dispatcher(1);
        dispatcher.shutdown().await;
        let result = dispatcher.dispatch(&RawCellLocation::gsm(1)).await;
        assert!(matches!(result, Err(EngineError::DispatcherClosed)));
    }
}
