//! Notification event payload.

use burrow_core::{PartitionStatus, Severity};
use serde::Serialize;

/// Why an event was dispatched. Carried for sinks and logging; the wire
/// payload expresses closure through the `complete` flag instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// First non-OK observation for the group.
    Open,
    /// Incident still open past the send interval.
    Reminder,
    /// Severity changed while the incident was open.
    Change,
    /// Group returned to OK.
    Close,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Open => "open",
            EventKind::Reminder => "reminder",
            EventKind::Change => "change",
            EventKind::Close => "close",
        }
    }
}

/// The payload delivered to sinks.
#[derive(Debug, Clone, Serialize)]
pub struct NotifierEvent {
    /// Incident ID; stable for the lifetime of one incident.
    pub id: String,
    pub cluster: String,
    pub group: String,
    /// When the incident was first observed (ms since epoch).
    pub start: i64,
    /// When this event was generated (ms since epoch).
    pub last: i64,
    /// Severity at dispatch time; OK only on closing events.
    pub status: Severity,
    /// True when this event closes the incident.
    pub complete: bool,
    pub partitions: Vec<PartitionStatus>,
    #[serde(skip)]
    pub kind: EventKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_not_serialized() {
        let event = NotifierEvent {
            id: "incident-1".to_string(),
            cluster: "local".to_string(),
            group: "billing".to_string(),
            start: 1_000,
            last: 2_000,
            status: Severity::Err,
            complete: false,
            partitions: vec![],
            kind: EventKind::Open,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("kind").is_none());
        assert_eq!(json["status"], "ERR");
        assert_eq!(json["complete"], false);
        assert_eq!(json["id"], "incident-1");
    }
}
