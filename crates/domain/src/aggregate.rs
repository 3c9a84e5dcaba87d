//! Core aggregate and domain event traits.

use common::AggregateId;
use event_store::Version;
use serde::{Serialize, de::DeserializeOwned};

/// Trait for domain events.
///
/// Domain events are facts: a parcel was registered, picked up, handed to a
/// warehouse. They are immutable and named in past tense.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the event type name, used for serialization and filtering.
    fn event_type(&self) -> &'static str;
}

/// Trait for aggregates in an event-sourced system.
///
/// An aggregate owns its own event stream and is never mutated directly:
/// - it is rebuilt by replaying events in stored order
/// - commands validate against current state and produce new events
/// - `apply` folds an event into state, purely and deterministically
pub trait Aggregate: Default + Send + Sync + Sized {
    /// The type of events this aggregate produces and consumes.
    type Event: DomainEvent;

    /// The type of errors this aggregate can produce.
    type Error: std::error::Error + Send + Sync;

    /// Returns the aggregate type name used for event store organization.
    fn aggregate_type() -> &'static str;

    /// Returns the aggregate's unique identifier.
    ///
    /// Returns None for a new, uninitialized aggregate.
    fn id(&self) -> Option<AggregateId>;

    /// Returns the current version of the aggregate.
    fn version(&self) -> Version;

    /// Sets the aggregate version. Called by the command handler after
    /// loading events.
    fn set_version(&mut self, version: Version);

    /// Applies an event to the aggregate, updating its state.
    ///
    /// Must be pure and deterministic: the same state and event always
    /// produce the same new state, with no side effects and no failure
    /// (events are facts that have already happened).
    fn apply(&mut self, event: Self::Event);

    /// Applies multiple events in sequence.
    fn apply_events(&mut self, events: impl IntoIterator<Item = Self::Event>) {
        for event in events {
            self.apply(event);
        }
    }
}

/// Trait for aggregates that support snapshotting.
///
/// Snapshotting avoids replaying a whole stream when loading an aggregate:
/// the state is periodically serialized and stored alongside the events.
pub trait SnapshotCapable: Aggregate + Serialize + DeserializeOwned {
    /// Returns the snapshot interval (number of events between snapshots).
    fn snapshot_interval() -> usize {
        100
    }

    /// Returns whether a snapshot should be taken at the current version.
    fn should_snapshot(&self) -> bool {
        self.version().as_i64() > 0
            && (self.version().as_i64() as usize).is_multiple_of(Self::snapshot_interval())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parcel::{Parcel, ParcelEvent};
    use chrono::Utc;
    use common::Location;

    use crate::parcel::{TransitPlan, VehicleId, WarehouseId};

    #[test]
    fn apply_events_folds_in_order() {
        let mut parcel = Parcel::default();
        let id = AggregateId::new();
        let events = vec![
            ParcelEvent::registered(
                id,
                Utc::now().date_naive(),
                Location::new(52.5, 13.4),
                Utc::now().date_naive(),
                Location::new(52.6, 13.5),
                TransitPlan::direct(WarehouseId::new("WH-BER")),
                Utc::now(),
            ),
            ParcelEvent::picked_up(VehicleId::new("V-1"), Utc::now()),
        ];

        parcel.apply_events(events);

        assert_eq!(parcel.id(), Some(id));
        assert_eq!(parcel.current_vehicle(), Some(&VehicleId::new("V-1")));
    }

    #[test]
    fn snapshot_interval_gate() {
        let mut parcel = Parcel::default();
        assert!(!parcel.should_snapshot());

        parcel.set_version(Version::new(Parcel::snapshot_interval() as i64));
        assert!(parcel.should_snapshot());

        parcel.set_version(Version::new(Parcel::snapshot_interval() as i64 + 1));
        assert!(!parcel.should_snapshot());
    }
}
