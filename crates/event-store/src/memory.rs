use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    AggregateId, EventEnvelope, EventStoreError, Result, Snapshot, Version,
    store::{AppendOptions, EventStore, EventStream, validate_events_for_append},
};

/// In-memory event store.
///
/// The shipped implementation: a single vector of envelopes behind an async
/// lock, with the same append validation and concurrency checks a durable
/// backend would enforce.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    events: Arc<RwLock<Vec<EventEnvelope>>>,
    snapshots: Arc<RwLock<HashMap<AggregateId, Snapshot>>>,
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events stored.
    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }

    /// Clears all events and snapshots.
    pub async fn clear(&self) {
        self.events.write().await.clear();
        self.snapshots.write().await.clear();
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version> {
        validate_events_for_append(&events)?;

        let first_event = &events[0];
        let aggregate_id = first_event.aggregate_id;

        let mut store = self.events.write().await;

        // Current version for this aggregate
        let current_version = store
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .map(|e| e.version)
            .max()
            .unwrap_or(Version::initial());

        if let Some(expected) = options.expected_version
            && current_version != expected
        {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual: current_version,
            });
        }

        // Reject rewrites of already-occupied stream positions even when the
        // caller skipped the expected-version check.
        let first_new_version = first_event.version;
        if first_new_version <= current_version && current_version != Version::initial() {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected: options.expected_version.unwrap_or(current_version),
                actual: current_version,
            });
        }

        let last_version = events
            .last()
            .map(|e| e.version)
            .unwrap_or(Version::initial());
        store.extend(events);

        Ok(last_version)
    }

    async fn get_events_for_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Vec<EventEnvelope>> {
        let store = self.events.read().await;
        let mut events: Vec<_> = store
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.version);
        Ok(events)
    }

    async fn get_events_for_aggregate_from_version(
        &self,
        aggregate_id: AggregateId,
        from_version: Version,
    ) -> Result<Vec<EventEnvelope>> {
        let store = self.events.read().await;
        let mut events: Vec<_> = store
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id && e.version >= from_version)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.version);
        Ok(events)
    }

    async fn stream_all_events(&self) -> Result<EventStream> {
        use futures_util::stream;

        let store = self.events.read().await;
        let events = store.clone();

        let stream = stream::iter(events.into_iter().map(Ok));
        Ok(Box::pin(stream))
    }

    async fn get_aggregate_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>> {
        let store = self.events.read().await;
        let version = store
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .map(|e| e.version)
            .max();
        Ok(version)
    }

    async fn purge_aggregate(&self, aggregate_id: AggregateId) -> Result<()> {
        let mut store = self.events.write().await;
        store.retain(|e| e.aggregate_id != aggregate_id);
        self.snapshots.write().await.remove(&aggregate_id);
        tracing::debug!(%aggregate_id, "aggregate stream purged");
        Ok(())
    }

    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()> {
        let mut snapshots = self.snapshots.write().await;
        snapshots.insert(snapshot.aggregate_id, snapshot);
        Ok(())
    }

    async fn get_snapshot(&self, aggregate_id: AggregateId) -> Result<Option<Snapshot>> {
        let snapshots = self.snapshots.read().await;
        Ok(snapshots.get(&aggregate_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_event(aggregate_id: AggregateId, version: Version, event_type: &str) -> EventEnvelope {
        EventEnvelope::builder()
            .aggregate_id(aggregate_id)
            .aggregate_type("Parcel")
            .event_type(event_type)
            .version(version)
            .payload_raw(serde_json::json!({"test": true}))
            .build()
    }

    #[tokio::test]
    async fn append_single_event() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();
        let event = test_event(aggregate_id, Version::first(), "ParcelRegistered");

        let result = store.append(vec![event], AppendOptions::expect_new()).await;
        assert_eq!(result.unwrap(), Version::first());

        let events = store.get_events_for_aggregate(aggregate_id).await.unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn append_multiple_events() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();

        let events = vec![
            test_event(aggregate_id, Version::new(1), "ParcelRegistered"),
            test_event(aggregate_id, Version::new(2), "ParcelPickedUp"),
            test_event(aggregate_id, Version::new(3), "ParcelArrivedAtWarehouse"),
        ];

        let result = store.append(events, AppendOptions::expect_new()).await;
        assert_eq!(result.unwrap(), Version::new(3));

        let stored = store.get_events_for_aggregate(aggregate_id).await.unwrap();
        assert_eq!(stored.len(), 3);
    }

    #[tokio::test]
    async fn concurrency_conflict_on_wrong_version() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();

        let event1 = test_event(aggregate_id, Version::first(), "ParcelRegistered");
        store
            .append(vec![event1], AppendOptions::expect_new())
            .await
            .unwrap();

        // Writer that thinks the stream is still empty loses.
        let event2 = test_event(aggregate_id, Version::new(2), "ParcelPickedUp");
        let result = store
            .append(
                vec![event2],
                AppendOptions::expect_version(Version::initial()),
            )
            .await;

        assert!(matches!(
            result,
            Err(EventStoreError::ConcurrencyConflict { .. })
        ));
    }

    #[tokio::test]
    async fn append_with_correct_expected_version() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();

        let event1 = test_event(aggregate_id, Version::first(), "ParcelRegistered");
        store
            .append(vec![event1], AppendOptions::expect_new())
            .await
            .unwrap();

        let event2 = test_event(aggregate_id, Version::new(2), "ParcelPickedUp");
        let result = store
            .append(
                vec![event2],
                AppendOptions::expect_version(Version::first()),
            )
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn rejected_append_leaves_log_unchanged() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();

        let event1 = test_event(aggregate_id, Version::first(), "ParcelRegistered");
        store
            .append(vec![event1], AppendOptions::expect_new())
            .await
            .unwrap();

        let event2 = test_event(aggregate_id, Version::new(2), "ParcelPickedUp");
        let result = store
            .append(
                vec![event2],
                AppendOptions::expect_version(Version::new(7)),
            )
            .await;
        assert!(result.is_err());

        assert_eq!(store.event_count().await, 1);
    }

    #[tokio::test]
    async fn get_events_from_version() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();

        let events = vec![
            test_event(aggregate_id, Version::new(1), "ParcelRegistered"),
            test_event(aggregate_id, Version::new(2), "ParcelPickedUp"),
            test_event(aggregate_id, Version::new(3), "ParcelArrivedAtWarehouse"),
        ];
        store.append(events, AppendOptions::new()).await.unwrap();

        let from_v2 = store
            .get_events_for_aggregate_from_version(aggregate_id, Version::new(2))
            .await
            .unwrap();
        assert_eq!(from_v2.len(), 2);
        assert_eq!(from_v2[0].version, Version::new(2));
        assert_eq!(from_v2[1].version, Version::new(3));
    }

    #[tokio::test]
    async fn purge_removes_stream_and_snapshot() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();
        let other_id = AggregateId::new();

        store
            .append(
                vec![test_event(aggregate_id, Version::first(), "ParcelRegistered")],
                AppendOptions::new(),
            )
            .await
            .unwrap();
        store
            .append(
                vec![test_event(other_id, Version::first(), "ParcelRegistered")],
                AppendOptions::new(),
            )
            .await
            .unwrap();
        store
            .save_snapshot(Snapshot::new(
                aggregate_id,
                "Parcel",
                Version::first(),
                serde_json::json!({}),
            ))
            .await
            .unwrap();

        store.purge_aggregate(aggregate_id).await.unwrap();

        assert!(
            store
                .get_events_for_aggregate(aggregate_id)
                .await
                .unwrap()
                .is_empty()
        );
        assert!(store.get_snapshot(aggregate_id).await.unwrap().is_none());
        // Other streams untouched.
        assert_eq!(
            store.get_events_for_aggregate(other_id).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn snapshot_save_and_retrieve() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();

        let snapshot = Snapshot::new(
            aggregate_id,
            "Parcel",
            Version::new(5),
            serde_json::json!({"status": "IN_WAREHOUSE"}),
        );

        store.save_snapshot(snapshot.clone()).await.unwrap();

        let retrieved = store.get_snapshot(aggregate_id).await.unwrap().unwrap();
        assert_eq!(retrieved.aggregate_id, aggregate_id);
        assert_eq!(retrieved.version, Version::new(5));
    }

    #[tokio::test]
    async fn stream_all_events_in_insertion_order() {
        use futures_util::StreamExt;

        let store = InMemoryEventStore::new();
        let id1 = AggregateId::new();
        let id2 = AggregateId::new();

        store
            .append(
                vec![test_event(id1, Version::first(), "ParcelRegistered")],
                AppendOptions::new(),
            )
            .await
            .unwrap();
        store
            .append(
                vec![test_event(id2, Version::first(), "ParcelRegistered")],
                AppendOptions::new(),
            )
            .await
            .unwrap();

        let stream = store.stream_all_events().await.unwrap();
        let events: Vec<_> = stream.collect().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].as_ref().unwrap().aggregate_id, id1);
        assert_eq!(events[1].as_ref().unwrap().aggregate_id, id2);
    }

    #[tokio::test]
    async fn get_aggregate_version() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();

        let version = store.get_aggregate_version(aggregate_id).await.unwrap();
        assert!(version.is_none());

        let events = vec![
            test_event(aggregate_id, Version::new(1), "ParcelRegistered"),
            test_event(aggregate_id, Version::new(2), "ParcelPickedUp"),
        ];
        store.append(events, AppendOptions::new()).await.unwrap();

        let version = store.get_aggregate_version(aggregate_id).await.unwrap();
        assert_eq!(version, Some(Version::new(2)));
    }
}
