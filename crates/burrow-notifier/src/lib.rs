//! Burrow Notifier
//!
//! Periodically evaluates every consumer group and pushes status events to
//! configured sinks. One worker runs per sink, each with its own tick
//! interval, severity threshold, group filters, and incident state.
//!
//! ## Incident Policy
//!
//! Per group, per sink:
//!
//! - First non-OK observation opens an incident (fresh UUID) and
//!   dispatches an OPEN event.
//! - While the incident stays open at the same severity, a REMINDER goes
//!   out once per send interval.
//! - A severity change dispatches CHANGE immediately.
//! - Return to OK dispatches CLOSE and clears the incident.
//!
//! Sink failures are logged and counted; incident state is preserved so
//! the next tick retries, and a failing sink never blocks the tick loop.

pub mod event;
pub mod filter;
pub mod incident;
pub mod notifier;
pub mod sinks;

pub use event::{EventKind, NotifierEvent};
pub use filter::GroupFilter;
pub use incident::IncidentTracker;
pub use notifier::NotifierWorker;
pub use sinks::{build_sink, LogSink, NotifierSink, SinkError, WebhookSink};
