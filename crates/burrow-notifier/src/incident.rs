//! Per-group incident state and the send policy.
//!
//! The tracker separates deciding from recording: [`IncidentTracker::observe`]
//! computes the event a status observation calls for without touching
//! state, and [`IncidentTracker::commit`] applies the transition. Workers
//! commit only after a sink accepts the event, so a failed dispatch leaves
//! the incident state untouched and the next tick retries.

use std::collections::HashMap;

use burrow_core::{GroupStatus, Severity};
use uuid::Uuid;

use crate::event::{EventKind, NotifierEvent};

/// State held for one open incident.
#[derive(Debug, Clone)]
pub struct IncidentState {
    pub id: String,
    pub status: Severity,
    pub first_seen: i64,
    pub last_send: i64,
}

/// Tracks incidents for one notifier sink and decides what, if anything,
/// to dispatch for each observation.
///
/// Severities below the sink's threshold count as OK for this tracker, so
/// a WARN-only wobble never opens an incident on an ERR-threshold sink,
/// and an open incident closes once the group drops below the threshold.
pub struct IncidentTracker {
    incidents: HashMap<(String, String), IncidentState>,
    send_interval_ms: i64,
    threshold: Severity,
}

impl IncidentTracker {
    pub fn new(send_interval_ms: i64, threshold: Severity) -> Self {
        IncidentTracker {
            incidents: HashMap::new(),
            send_interval_ms,
            threshold,
        }
    }

    pub fn open_incidents(&self) -> usize {
        self.incidents.len()
    }

    /// Decide what to dispatch for one evaluation result, without changing
    /// any state. `now_ms` is supplied by the caller so the policy stays
    /// deterministic under test.
    pub fn observe(&self, status: &GroupStatus, now_ms: i64) -> Option<NotifierEvent> {
        let key = (status.cluster.clone(), status.group.clone());
        let severity = if status.status >= self.threshold {
            status.status
        } else {
            Severity::Ok
        };

        let incident = self.incidents.get(&key);
        match (incident, severity) {
            (None, Severity::Ok) => None,
            (None, _) => {
                // First non-OK observation: open a fresh incident.
                let incident = IncidentState {
                    id: Uuid::new_v4().to_string(),
                    status: severity,
                    first_seen: now_ms,
                    last_send: now_ms,
                };
                Some(make_event(&incident, status, severity, now_ms, EventKind::Open))
            }
            (Some(incident), Severity::Ok) => Some(make_event(
                incident,
                status,
                Severity::Ok,
                now_ms,
                EventKind::Close,
            )),
            (Some(incident), _) if incident.status != severity => Some(make_event(
                incident,
                status,
                severity,
                now_ms,
                EventKind::Change,
            )),
            (Some(incident), _) if incident.last_send + self.send_interval_ms <= now_ms => {
                Some(make_event(
                    incident,
                    status,
                    severity,
                    now_ms,
                    EventKind::Reminder,
                ))
            }
            (Some(_), _) => None,
        }
    }

    /// Record a dispatched event. Called only after the sink accepted it.
    pub fn commit(&mut self, event: &NotifierEvent) {
        let key = (event.cluster.clone(), event.group.clone());
        match event.kind {
            EventKind::Close => {
                self.incidents.remove(&key);
            }
            EventKind::Open => {
                self.incidents.insert(
                    key,
                    IncidentState {
                        id: event.id.clone(),
                        status: event.status,
                        first_seen: event.start,
                        last_send: event.last,
                    },
                );
            }
            EventKind::Change | EventKind::Reminder => {
                if let Some(incident) = self.incidents.get_mut(&key) {
                    incident.status = event.status;
                    incident.last_send = event.last;
                }
            }
        }
    }

    /// Forget a group entirely, e.g. after it was deleted from the store.
    pub fn forget(&mut self, cluster: &str, group: &str) {
        self.incidents
            .remove(&(cluster.to_string(), group.to_string()));
    }
}

fn make_event(
    incident: &IncidentState,
    status: &GroupStatus,
    severity: Severity,
    now_ms: i64,
    kind: EventKind,
) -> NotifierEvent {
    NotifierEvent {
        id: incident.id.clone(),
        cluster: status.cluster.clone(),
        group: status.group.clone(),
        start: incident.first_seen,
        last: now_ms,
        status: severity,
        complete: kind == EventKind::Close,
        partitions: status.partitions.clone(),
        kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(severity: Severity) -> GroupStatus {
        GroupStatus {
            cluster: "local".to_string(),
            group: "billing".to_string(),
            status: severity,
            partitions: vec![],
            total_lag: 0,
        }
    }

    /// Observe-then-commit, the path taken when the sink accepts.
    fn step(tracker: &mut IncidentTracker, severity: Severity, now_ms: i64) -> Option<NotifierEvent> {
        let event = tracker.observe(&status(severity), now_ms);
        if let Some(event) = &event {
            tracker.commit(event);
        }
        event
    }

    #[test]
    fn test_ok_group_never_notifies() {
        let mut tracker = IncidentTracker::new(300_000, Severity::Warn);
        assert!(step(&mut tracker, Severity::Ok, 1_000).is_none());
        assert!(step(&mut tracker, Severity::Ok, 2_000).is_none());
        assert_eq!(tracker.open_incidents(), 0);
    }

    #[test]
    fn test_incident_lifecycle() {
        let mut tracker = IncidentTracker::new(300_000, Severity::Warn);

        // First non-OK observation opens.
        let open = step(&mut tracker, Severity::Err, 1_000).unwrap();
        assert_eq!(open.kind, EventKind::Open);
        assert_eq!(open.start, 1_000);
        assert!(!open.complete);
        assert_eq!(tracker.open_incidents(), 1);

        // Same severity inside the send interval: quiet.
        assert!(step(&mut tracker, Severity::Err, 100_000).is_none());

        // Past the send interval: reminder with the same incident ID.
        let reminder = step(&mut tracker, Severity::Err, 301_000).unwrap();
        assert_eq!(reminder.kind, EventKind::Reminder);
        assert_eq!(reminder.id, open.id);
        assert_eq!(reminder.start, 1_000);

        // Recovery closes and clears state.
        let close = step(&mut tracker, Severity::Ok, 400_000).unwrap();
        assert_eq!(close.kind, EventKind::Close);
        assert_eq!(close.id, open.id);
        assert!(close.complete);
        assert_eq!(close.status, Severity::Ok);
        assert_eq!(tracker.open_incidents(), 0);

        // A new incident gets a new ID.
        let reopened = step(&mut tracker, Severity::Err, 500_000).unwrap();
        assert_eq!(reopened.kind, EventKind::Open);
        assert_ne!(reopened.id, open.id);
    }

    #[test]
    fn test_severity_change_dispatches_immediately() {
        let mut tracker = IncidentTracker::new(300_000, Severity::Warn);
        let open = step(&mut tracker, Severity::Warn, 1_000).unwrap();
        assert_eq!(open.status, Severity::Warn);

        // Escalation inside the send interval still goes out.
        let change = step(&mut tracker, Severity::Err, 2_000).unwrap();
        assert_eq!(change.kind, EventKind::Change);
        assert_eq!(change.status, Severity::Err);
        assert_eq!(change.id, open.id);

        // De-escalation back to WARN is also a change.
        let change = step(&mut tracker, Severity::Warn, 3_000).unwrap();
        assert_eq!(change.kind, EventKind::Change);
        assert_eq!(change.status, Severity::Warn);
    }

    #[test]
    fn test_change_resets_reminder_clock() {
        let mut tracker = IncidentTracker::new(300_000, Severity::Warn);
        step(&mut tracker, Severity::Warn, 1_000).unwrap();
        step(&mut tracker, Severity::Err, 200_000).unwrap();

        // 301s after open but only 101s after the change: no reminder yet.
        assert!(step(&mut tracker, Severity::Err, 301_000).is_none());
        assert!(step(&mut tracker, Severity::Err, 500_000).is_some());
    }

    #[test]
    fn test_below_threshold_counts_as_ok() {
        let mut tracker = IncidentTracker::new(300_000, Severity::Err);

        // WARN never opens on an ERR-threshold sink.
        assert!(step(&mut tracker, Severity::Warn, 1_000).is_none());

        // ERR opens; dropping to WARN closes.
        let open = step(&mut tracker, Severity::Err, 2_000).unwrap();
        assert_eq!(open.kind, EventKind::Open);
        let close = step(&mut tracker, Severity::Warn, 3_000).unwrap();
        assert_eq!(close.kind, EventKind::Close);
    }

    #[test]
    fn test_uncommitted_observation_leaves_state_alone() {
        // A failed dispatch never advances the policy.
        let mut tracker = IncidentTracker::new(300_000, Severity::Warn);
        let first = tracker.observe(&status(Severity::Err), 1_000).unwrap();
        assert_eq!(first.kind, EventKind::Open);
        assert_eq!(tracker.open_incidents(), 0);

        // The next tick opens again.
        let retry = tracker.observe(&status(Severity::Err), 2_000).unwrap();
        assert_eq!(retry.kind, EventKind::Open);

        tracker.commit(&retry);
        assert_eq!(tracker.open_incidents(), 1);

        // An uncommitted close leaves the incident open for a retry.
        let close = tracker.observe(&status(Severity::Ok), 3_000).unwrap();
        assert_eq!(close.kind, EventKind::Close);
        assert_eq!(tracker.open_incidents(), 1);
        let close_again = tracker.observe(&status(Severity::Ok), 4_000).unwrap();
        assert_eq!(close_again.kind, EventKind::Close);
        tracker.commit(&close_again);
        assert_eq!(tracker.open_incidents(), 0);
    }

    #[test]
    fn test_forget_clears_state() {
        let mut tracker = IncidentTracker::new(300_000, Severity::Warn);
        let open = step(&mut tracker, Severity::Err, 1_000).unwrap();
        assert_eq!(open.kind, EventKind::Open);
        tracker.forget("local", "billing");
        assert_eq!(tracker.open_incidents(), 0);
    }
}
