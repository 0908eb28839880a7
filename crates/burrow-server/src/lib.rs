//! Burrow Server
//!
//! The coordinator ties the subsystems together: it constructs them
//! against one immutable configuration snapshot, starts them in
//! dependency order (store, producer modules, evaluator, notifiers,
//! HTTP), and stops them in reverse. Each module's start is non-blocking
//! and each stop drains within a bounded budget.

pub mod coordinator;
pub mod modules;

pub use coordinator::Coordinator;
pub use modules::Module;
