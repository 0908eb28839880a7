//! The per-sink notifier worker and its tick loop.

use std::sync::Arc;
use std::time::Duration;

use burrow_core::{now_ms, NotifierConfig, Result};
use burrow_evaluator::Evaluator;
use burrow_store::StorageHandle;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::event::NotifierEvent;
use crate::filter::GroupFilter;
use crate::incident::IncidentTracker;
use crate::sinks::{build_sink, NotifierSink};
use burrow_observability::metrics::{NOTIFIER_EVENTS_TOTAL, NOTIFIER_FAILURES_TOTAL};

/// One worker per configured sink. On every tick it enumerates the groups
/// of every cluster, runs the evaluator, feeds results through the
/// incident policy, and dispatches whatever events fall out.
pub struct NotifierWorker {
    name: String,
    interval: Duration,
    filter: GroupFilter,
    tracker: IncidentTracker,
    sink: Arc<dyn NotifierSink>,
    storage: StorageHandle,
    evaluator: Arc<Evaluator>,
    shutdown: watch::Receiver<bool>,
}

impl NotifierWorker {
    pub fn from_config(
        config: &NotifierConfig,
        storage: StorageHandle,
        evaluator: Arc<Evaluator>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Self> {
        let filter = GroupFilter::new(
            config.group_allowlist.as_deref(),
            config.group_blocklist.as_deref(),
        )?;
        let tracker = IncidentTracker::new(
            config.send_interval_secs as i64 * 1000,
            config.threshold,
        );
        let sink = build_sink(config)?;
        Ok(NotifierWorker {
            name: config.name.clone(),
            interval: Duration::from_secs(config.interval_secs),
            filter,
            tracker,
            sink,
            storage,
            evaluator,
            shutdown,
        })
    }

    /// Run until shutdown. The first tick fires immediately.
    pub async fn run(mut self) {
        info!(
            sink = %self.name,
            interval_secs = self.interval.as_secs(),
            "notifier worker started"
        );
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick().await,
                _ = self.shutdown.changed() => {
                    if *self.shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!(sink = %self.name, open_incidents = self.tracker.open_incidents(), "notifier worker stopped");
    }

    /// One pass over every group of every cluster.
    pub async fn tick(&mut self) {
        let clusters: Vec<String> = self.storage.clusters().to_vec();
        for cluster in clusters {
            let groups = match self.storage.fetch_group_list(&cluster).await {
                Ok(groups) => groups,
                Err(e) => {
                    warn!(sink = %self.name, cluster = %cluster, error = %e, "group list fetch failed");
                    continue;
                }
            };

            for group in groups {
                if !self.filter.matches(&group) {
                    continue;
                }
                let status = match self.evaluator.group_status(&cluster, &group).await {
                    Ok(status) => status,
                    Err(e) => {
                        // The group may have been deleted between the list
                        // and the fetch; drop any incident we held for it.
                        if e.is_not_found() {
                            self.tracker.forget(&cluster, &group);
                        } else {
                            warn!(sink = %self.name, cluster = %cluster, group = %group, error = %e, "evaluation failed");
                        }
                        continue;
                    }
                };

                if let Some(event) = self.tracker.observe(&status, now_ms()) {
                    // Record the transition only once the sink accepted the
                    // event; a failed dispatch is retried next tick.
                    if self.dispatch(&event).await {
                        self.tracker.commit(&event);
                    }
                }
            }
        }
    }

    async fn dispatch(&self, event: &NotifierEvent) -> bool {
        debug!(
            sink = %self.name,
            incident = %event.id,
            group = %event.group,
            kind = event.kind.as_str(),
            "dispatching event"
        );
        match self.sink.dispatch(event).await {
            Ok(()) => {
                NOTIFIER_EVENTS_TOTAL
                    .with_label_values(&[&self.name, event.kind.as_str()])
                    .inc();
                true
            }
            Err(e) => {
                warn!(sink = %self.name, incident = %event.id, error = %e, "dispatch failed");
                NOTIFIER_FAILURES_TOTAL.with_label_values(&[&self.name]).inc();
                false
            }
        }
    }

    /// Replace the sink while keeping the policy state and filters.
    pub fn with_sink(mut self, sink: Arc<dyn NotifierSink>) -> Self {
        self.sink = sink;
        self
    }
}
