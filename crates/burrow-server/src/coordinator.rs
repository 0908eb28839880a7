//! Subsystem lifecycle coordination.

use std::sync::Arc;

use burrow_api::{create_router, AppState};
use burrow_core::{BurrowConfig, Result};
use burrow_evaluator::Evaluator;
use burrow_notifier::NotifierWorker;
use burrow_store::{OffsetStore, StorageHandle};
use tokio::sync::watch;
use tracing::{error, info};

use crate::modules::{EvaluatorModule, HttpModule, Module, NotifierModule, StorageModule};

/// Builds every subsystem from one validated configuration snapshot and
/// runs their lifecycle: start in dependency order, stop in reverse.
pub struct Coordinator {
    modules: Vec<Box<dyn Module>>,
    /// Where externally registered producer modules slot in: after the
    /// store, before the evaluator.
    producer_insert_at: usize,
    started: usize,
    handle: StorageHandle,
}

impl Coordinator {
    pub fn new(config: BurrowConfig) -> Result<Self> {
        config.validate()?;
        burrow_observability::init_metrics();

        let store = OffsetStore::new(&config);
        let handle = store.handle();
        let evaluator = Arc::new(Evaluator::new(handle.clone(), &config));

        let (notifier_shutdown_tx, notifier_shutdown_rx) = watch::channel(false);
        let workers = config
            .notifiers
            .iter()
            .map(|notifier| {
                NotifierWorker::from_config(
                    notifier,
                    handle.clone(),
                    Arc::clone(&evaluator),
                    notifier_shutdown_rx.clone(),
                )
            })
            .collect::<Result<Vec<_>>>()?;

        let state = AppState {
            storage: handle.clone(),
            evaluator: Arc::clone(&evaluator),
            clusters: Arc::new(config.clusters.clone()),
        };
        let router = create_router(state, &config.http);

        let modules: Vec<Box<dyn Module>> = vec![
            Box::new(StorageModule::new(store)),
            Box::new(EvaluatorModule::new(evaluator)),
            Box::new(NotifierModule::new(workers, notifier_shutdown_tx)),
            Box::new(HttpModule::new(router, config.http.address.clone())),
        ];

        Ok(Coordinator {
            modules,
            producer_insert_at: 1,
            started: 0,
            handle,
        })
    }

    /// Assemble a coordinator from pre-built modules, in start order.
    /// Used by tests and embedders wiring custom module sets.
    pub fn from_modules(modules: Vec<Box<dyn Module>>, handle: StorageHandle) -> Self {
        let producer_insert_at = modules.len().min(1);
        Coordinator {
            modules,
            producer_insert_at,
            started: 0,
            handle,
        }
    }

    /// The producer interface handed to cluster and consumer modules.
    pub fn storage(&self) -> StorageHandle {
        self.handle.clone()
    }

    /// Register an external producer module (cluster client, consumer
    /// offsets reader). It starts after the store and stops before it.
    pub fn register_producer(&mut self, module: Box<dyn Module>) {
        self.modules.insert(self.producer_insert_at, module);
        self.producer_insert_at += 1;
    }

    /// Start modules in order. On failure everything already started is
    /// stopped again, in reverse, before the error is returned.
    pub async fn start(&mut self) -> Result<()> {
        for i in self.started..self.modules.len() {
            let module = &mut self.modules[i];
            info!(module = module.name(), "starting");
            if let Err(e) = module.start().await {
                error!(module = module.name(), error = %e, "start failed");
                self.stop().await;
                return Err(e);
            }
            self.started = i + 1;
        }
        info!("all modules started");
        Ok(())
    }

    /// Stop started modules in reverse order. Errors are logged, never
    /// propagated, so every module gets its chance to drain. Idempotent.
    pub async fn stop(&mut self) {
        while self.started > 0 {
            self.started -= 1;
            let module = &mut self.modules[self.started];
            info!(module = module.name(), "stopping");
            if let Err(e) = module.stop().await {
                error!(module = module.name(), error = %e, "stop failed");
            }
        }
        info!("all modules stopped");
    }
}
