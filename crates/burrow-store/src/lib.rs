//! Burrow Offset Store
//!
//! The sharded in-memory store at the center of Burrow, together with the
//! message bus that connects producers (cluster and consumer modules) to
//! the store workers and its consumers (evaluator, notifier, HTTP).
//!
//! ## Architecture
//!
//! ```text
//!  cluster modules ──┐                       ┌── shard worker 0 ──┐
//!  consumer modules ─┤→ StorageHandle ──────→│   shard worker 1   │ owned group maps
//!  HTTP / notifier ──┘   (routing)           │   ...              │
//!                          │                 └── shard worker N ──┘
//!                          └───────────────→ broker-offset worker → BrokerOffsets table
//! ```
//!
//! - Each shard worker exclusively owns the groups routed to it by
//!   `stable_hash(cluster + group) mod N`; no cross-shard locking exists.
//! - Broker LEO updates flow through a single dedicated worker that is the
//!   only writer of the [`BrokerOffsets`] table; shard workers read it
//!   lock-free when capturing lag at commit arrival time.
//! - Fetches carry single-use reply channels. A shard that shuts down
//!   before replying simply drops the sender, which the caller observes as
//!   `ShuttingDown`.
//! - A background sweeper evicts groups whose newest sample is older than
//!   the configured expiry.
//!
//! ## Backpressure
//!
//! Shard queues are bounded (`store.queue_depth`, default 1). Offset
//! writes never wait: a full queue drops the sample and increments a
//! per-shard counter. Fetch callers wait up to `store.queue_send_timeout`
//! for queue space before failing with `Busy`.

pub mod broker;
pub mod bus;
pub mod ring;
pub mod shard;
pub mod store;

pub use broker::BrokerOffsets;
pub use bus::{route_shard, StorageHandle};
pub use ring::{OffsetRing, PushOutcome};
pub use store::OffsetStore;
