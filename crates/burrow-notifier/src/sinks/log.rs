//! Log sink: one structured line per event.

use async_trait::async_trait;
use tracing::info;

use super::{NotifierSink, SinkError};
use crate::event::NotifierEvent;

pub struct LogSink {
    name: String,
}

impl LogSink {
    pub fn new(name: &str) -> Self {
        LogSink {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl NotifierSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn dispatch(&self, event: &NotifierEvent) -> Result<(), SinkError> {
        info!(
            sink = %self.name,
            incident = %event.id,
            cluster = %event.cluster,
            group = %event.group,
            status = %event.status,
            kind = event.kind.as_str(),
            partitions = event.partitions.len(),
            "consumer group status event"
        );
        Ok(())
    }
}
