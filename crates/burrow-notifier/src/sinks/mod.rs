//! Notification sinks.
//!
//! A sink is anything that can deliver a [`NotifierEvent`]. Failures are
//! surfaced to the worker, which logs and counts them; they never abort
//! the tick loop and the incident state is preserved for a retry on the
//! next tick.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::event::NotifierEvent;
use burrow_core::{BurrowError, NotifierConfig, NotifierKind, Result};

mod log;
mod webhook;

pub use log::LogSink;
pub use webhook::WebhookSink;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("sink rejected event: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait NotifierSink: Send + Sync {
    fn name(&self) -> &str;

    async fn dispatch(&self, event: &NotifierEvent) -> std::result::Result<(), SinkError>;
}

/// Build the sink described by one notifier config entry.
pub fn build_sink(config: &NotifierConfig) -> Result<Arc<dyn NotifierSink>> {
    match config.kind {
        NotifierKind::Webhook => Ok(Arc::new(WebhookSink::new(config)?)),
        NotifierKind::Log => Ok(Arc::new(LogSink::new(&config.name))),
    }
}

/// Helper shared by sink constructors.
pub(crate) fn required_url(config: &NotifierConfig) -> Result<String> {
    config.url.clone().ok_or_else(|| {
        BurrowError::Config(format!("notifier {} has no url configured", config.name))
    })
}
