//! Store lifecycle: spawning shard workers, the broker-offset worker, and
//! the expiry sweeper, and shutting them down within a bounded budget.

use std::sync::Arc;
use std::time::Duration;

use burrow_core::{now_ms, BurrowConfig, Result, StoreConfig};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::broker::{BrokerOffsets, BrokerRequest, BrokerWorker};
use crate::bus::StorageHandle;
use crate::shard::{ShardRequest, ShardWorker};

/// How long `stop` waits for each worker to drain before abandoning it.
const SHUTDOWN_BUDGET: Duration = Duration::from_secs(5);

/// The sharded in-memory offset store.
///
/// `new` wires up channels and the handle without spawning anything, so
/// collaborators can be constructed against the handle first. `start`
/// spawns the workers and returns immediately; `stop` signals shutdown and
/// waits for the workers to exit.
pub struct OffsetStore {
    config: StoreConfig,
    handle: StorageHandle,
    table: Arc<BrokerOffsets>,
    shard_rxs: Vec<mpsc::Receiver<ShardRequest>>,
    broker_rx: Option<mpsc::Receiver<BrokerRequest>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl OffsetStore {
    pub fn new(config: &BurrowConfig) -> Self {
        let store_config = config.store.clone();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut shard_txs = Vec::with_capacity(store_config.workers);
        let mut shard_rxs = Vec::with_capacity(store_config.workers);
        for _ in 0..store_config.workers {
            let (tx, rx) = mpsc::channel(store_config.queue_depth);
            shard_txs.push(tx);
            shard_rxs.push(rx);
        }
        let (broker_tx, broker_rx) = mpsc::channel(store_config.queue_depth.max(16));

        let table = Arc::new(BrokerOffsets::new());
        let clusters = config.clusters.iter().map(|c| c.name.clone()).collect();
        let handle = StorageHandle::new(
            shard_txs,
            broker_tx,
            clusters,
            Duration::from_secs(store_config.queue_send_timeout_secs),
            shutdown_rx.clone(),
        );

        OffsetStore {
            config: store_config,
            handle,
            table,
            shard_rxs,
            broker_rx: Some(broker_rx),
            shutdown_tx,
            shutdown_rx,
            tasks: Vec::new(),
        }
    }

    /// The producer/fetch handle. Valid before `start`; requests queue up
    /// to the configured depth until the workers run.
    pub fn handle(&self) -> StorageHandle {
        self.handle.clone()
    }

    /// Spawn all workers. Non-blocking; returns once everything is spawned.
    pub fn start(&mut self) {
        info!(
            workers = self.config.workers,
            window_size = self.config.window_size,
            queue_depth = self.config.queue_depth,
            "starting offset store"
        );

        for (id, rx) in self.shard_rxs.drain(..).enumerate() {
            let worker = ShardWorker::new(
                id,
                Arc::clone(&self.table),
                self.config.window_size,
                self.config.min_distance_ms(),
                rx,
                self.shutdown_rx.clone(),
            );
            self.tasks.push(tokio::spawn(worker.run()));
        }

        if let Some(rx) = self.broker_rx.take() {
            let worker = BrokerWorker::new(Arc::clone(&self.table), rx, self.shutdown_rx.clone());
            self.tasks.push(tokio::spawn(worker.run()));
        }

        self.tasks.push(tokio::spawn(run_sweeper(
            self.handle.clone(),
            self.config.expire_group_ms(),
            Duration::from_secs(self.config.sweep_interval_secs),
            self.shutdown_rx.clone(),
        )));
    }

    /// Signal shutdown and wait for every worker to exit, abandoning any
    /// that outlive the budget.
    pub async fn stop(&mut self) -> Result<()> {
        info!("stopping offset store");
        let _ = self.shutdown_tx.send(true);

        for task in self.tasks.drain(..) {
            match tokio::time::timeout(SHUTDOWN_BUDGET, task).await {
                Ok(_) => {}
                Err(_) => warn!("store worker did not stop within budget"),
            }
        }
        Ok(())
    }
}

/// Periodically asks every shard to drop groups whose newest sample is
/// older than the expiry window.
async fn run_sweeper(
    handle: StorageHandle,
    expire_group_ms: i64,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    debug!(interval_secs = interval.as_secs(), "expiry sweeper started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let cutoff_ms = now_ms() - expire_group_ms;
                for shard in handle.shards.iter() {
                    // Best effort: a busy shard gets swept next tick.
                    let _ = shard.try_send(ShardRequest::SweepExpired { cutoff_ms });
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    debug!("expiry sweeper stopped");
}
