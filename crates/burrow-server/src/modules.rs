//! The module interface and the built-in subsystem modules.
//!
//! External producer modules (Kafka broker clients, offsets-topic readers,
//! ZK watchers) implement [`Module`] too and are registered with the
//! coordinator between the store and the evaluator; they talk to the core
//! exclusively through a `StorageHandle`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use burrow_core::{BurrowError, Result};
use burrow_notifier::NotifierWorker;
use burrow_store::OffsetStore;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// How long module stops wait for their tasks to drain.
const STOP_BUDGET: Duration = Duration::from_secs(5);

/// A startable/stoppable subsystem. Configuration happens at
/// construction; `start` must return once workers are spawned, and `stop`
/// must drain in-flight work without leaking tasks.
#[async_trait]
pub trait Module: Send {
    fn name(&self) -> &'static str;

    async fn start(&mut self) -> Result<()>;

    async fn stop(&mut self) -> Result<()>;
}

/// Wraps the offset store.
pub struct StorageModule {
    store: OffsetStore,
}

impl StorageModule {
    pub fn new(store: OffsetStore) -> Self {
        StorageModule { store }
    }
}

#[async_trait]
impl Module for StorageModule {
    fn name(&self) -> &'static str {
        "storage"
    }

    async fn start(&mut self) -> Result<()> {
        self.store.start();
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.store.stop().await
    }
}

/// Spawns one worker task per configured notifier sink.
pub struct NotifierModule {
    workers: Vec<NotifierWorker>,
    tasks: Vec<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
}

impl NotifierModule {
    pub fn new(workers: Vec<NotifierWorker>, shutdown_tx: watch::Sender<bool>) -> Self {
        NotifierModule {
            workers,
            tasks: Vec::new(),
            shutdown_tx,
        }
    }
}

#[async_trait]
impl Module for NotifierModule {
    fn name(&self) -> &'static str {
        "notifier"
    }

    async fn start(&mut self) -> Result<()> {
        for worker in self.workers.drain(..) {
            self.tasks.push(tokio::spawn(worker.run()));
        }
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        let _ = self.shutdown_tx.send(true);
        for task in self.tasks.drain(..) {
            if tokio::time::timeout(STOP_BUDGET, task).await.is_err() {
                warn!("notifier worker did not stop within budget");
            }
        }
        Ok(())
    }
}

/// Binds the listener at start and serves until stopped.
pub struct HttpModule {
    router: Option<axum::Router>,
    address: String,
    task: Option<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl HttpModule {
    pub fn new(router: axum::Router, address: String) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        HttpModule {
            router: Some(router),
            address,
            task: None,
            shutdown_tx,
            shutdown_rx,
        }
    }
}

#[async_trait]
impl Module for HttpModule {
    fn name(&self) -> &'static str {
        "httpserver"
    }

    async fn start(&mut self) -> Result<()> {
        let router = self
            .router
            .take()
            .ok_or_else(|| BurrowError::Config("http module already started".to_string()))?;

        // Bind here so a bad address fails startup, not a background task.
        let listener = burrow_api::bind(&self.address).await?;
        let shutdown = self.shutdown_rx.clone();
        self.task = Some(tokio::spawn(async move {
            if let Err(e) = burrow_api::serve_with_listener(listener, router, shutdown).await {
                error!(error = %e, "http server exited with error");
            }
        }));
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.task.take() {
            if tokio::time::timeout(STOP_BUDGET, task).await.is_err() {
                warn!("http server did not stop within budget");
            }
        }
        Ok(())
    }
}

/// The evaluator is a passive service queried by the notifier and HTTP
/// modules; this module only marks its place in the lifecycle order.
pub struct EvaluatorModule {
    evaluator: Arc<burrow_evaluator::Evaluator>,
}

impl EvaluatorModule {
    pub fn new(evaluator: Arc<burrow_evaluator::Evaluator>) -> Self {
        EvaluatorModule { evaluator }
    }
}

#[async_trait]
impl Module for EvaluatorModule {
    fn name(&self) -> &'static str {
        "evaluator"
    }

    async fn start(&mut self) -> Result<()> {
        info!(
            window_size = self.evaluator.rules().window_size,
            "evaluator ready"
        );
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        Ok(())
    }
}
