//! Append-only event log for the parcel system.
//!
//! Every parcel is persisted exclusively as an ordered stream of events;
//! current state is always derived by replaying that stream. This crate
//! provides the envelope/version types, the [`EventStore`] trait with
//! optimistic-concurrency appends, snapshots, and an in-memory
//! implementation.

pub mod error;
pub mod event;
pub mod memory;
pub mod snapshot;
pub mod store;

pub use common::AggregateId;
pub use error::{EventStoreError, Result};
pub use event::{EventEnvelope, EventEnvelopeBuilder, EventId, Version};
pub use memory::InMemoryEventStore;
pub use snapshot::Snapshot;
pub use store::{AppendOptions, EventStore, EventStoreExt, EventStream};
