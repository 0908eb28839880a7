//! Burrow Evaluator
//!
//! Classifies consumer group health from ring snapshots. The rule engine
//! in [`rules`] is a pure function of its input snapshot; [`Evaluator`]
//! wraps it with snapshot fetching and a short-lived result cache so the
//! notifier tick and concurrent HTTP queries share work.
//!
//! ## The Sliding Window
//!
//! Each partition is judged over its most recent W samples. No absolute
//! lag threshold exists anywhere: a consumer a million offsets behind but
//! making steady progress with stable lag is OK, while one ten offsets
//! behind whose commits have frozen while the broker moves on is in
//! trouble. The window shape alone decides.

pub mod evaluator;
pub mod rules;

pub use evaluator::Evaluator;
pub use rules::{classify_window, evaluate, RuleConfig};
