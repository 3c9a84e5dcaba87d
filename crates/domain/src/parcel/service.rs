//! Parcel service providing a simplified API for lifecycle operations.

use common::AggregateId;
use event_store::{EventEnvelope, EventStore};

use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;

use super::{
    CompleteTransfer, Parcel, RecordDelivery, RecordPickup, RecordWarehouseArrival, RegisterParcel,
    StartDelivery, StartTransfer,
};

impl From<super::ParcelError> for DomainError {
    fn from(e: super::ParcelError) -> Self {
        DomainError::Parcel(e)
    }
}

/// Service for driving parcels through their lifecycle.
///
/// Wraps the command handler; every mutating call validates the event
/// against the parcel's projected state and appends it in the same unit,
/// so a rejected event never reaches the stream.
pub struct ParcelService<S: EventStore> {
    handler: CommandHandler<S, Parcel>,
}

impl<S: EventStore> ParcelService<S> {
    /// Creates a new parcel service with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            handler: CommandHandler::new(store),
        }
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S, Parcel> {
        &self.handler
    }

    /// Registers a new parcel.
    #[tracing::instrument(skip(self))]
    pub async fn register(
        &self,
        cmd: RegisterParcel,
    ) -> Result<CommandResult<Parcel>, DomainError> {
        let result = self
            .handler
            .execute_with_snapshot(cmd.parcel_id, |parcel| {
                parcel.register(
                    cmd.parcel_id,
                    cmd.pickup_date,
                    cmd.pickup_location,
                    cmd.delivery_date,
                    cmd.delivery_location,
                    cmd.transit_warehouses.clone(),
                    chrono::Utc::now(),
                )
            })
            .await?;
        metrics::counter!("parcels_registered_total").increment(1);
        Ok(result)
    }

    /// Records a pickup.
    #[tracing::instrument(skip(self))]
    pub async fn record_pickup(
        &self,
        cmd: RecordPickup,
    ) -> Result<CommandResult<Parcel>, DomainError> {
        let vehicle_id = cmd.vehicle_id.clone();
        self.handler
            .execute_with_snapshot(cmd.parcel_id, |parcel| {
                parcel.record_pickup(vehicle_id, cmd.at)
            })
            .await
    }

    /// Records a warehouse arrival off the pickup vehicle.
    #[tracing::instrument(skip(self))]
    pub async fn record_warehouse_arrival(
        &self,
        cmd: RecordWarehouseArrival,
    ) -> Result<CommandResult<Parcel>, DomainError> {
        let warehouse_id = cmd.warehouse_id.clone();
        self.handler
            .execute_with_snapshot(cmd.parcel_id, |parcel| {
                parcel.record_warehouse_arrival(warehouse_id, cmd.at)
            })
            .await
    }

    /// Records departure on a nightly transfer.
    #[tracing::instrument(skip(self))]
    pub async fn start_transfer(
        &self,
        cmd: StartTransfer,
    ) -> Result<CommandResult<Parcel>, DomainError> {
        let destination = cmd.destination_warehouse_id.clone();
        self.handler
            .execute_with_snapshot(cmd.parcel_id, |parcel| {
                parcel.start_transfer(cmd.transfer_job_id, destination, cmd.at)
            })
            .await
    }

    /// Records the transfer's arrival at its destination warehouse.
    #[tracing::instrument(skip(self))]
    pub async fn complete_transfer(
        &self,
        cmd: CompleteTransfer,
    ) -> Result<CommandResult<Parcel>, DomainError> {
        let warehouse_id = cmd.warehouse_id.clone();
        self.handler
            .execute_with_snapshot(cmd.parcel_id, |parcel| {
                parcel.complete_transfer(warehouse_id, cmd.at)
            })
            .await
    }

    /// Records the start of the final delivery leg.
    #[tracing::instrument(skip(self))]
    pub async fn start_delivery(
        &self,
        cmd: StartDelivery,
    ) -> Result<CommandResult<Parcel>, DomainError> {
        let vehicle_id = cmd.vehicle_id.clone();
        self.handler
            .execute_with_snapshot(cmd.parcel_id, |parcel| {
                parcel.start_delivery(vehicle_id, cmd.at)
            })
            .await
    }

    /// Records final delivery to the customer.
    #[tracing::instrument(skip(self))]
    pub async fn record_delivery(
        &self,
        cmd: RecordDelivery,
    ) -> Result<CommandResult<Parcel>, DomainError> {
        let vehicle_id = cmd.vehicle_id.clone();
        let result = self
            .handler
            .execute_with_snapshot(cmd.parcel_id, |parcel| {
                parcel.record_delivery(vehicle_id, cmd.at)
            })
            .await?;
        metrics::counter!("parcels_delivered_total").increment(1);
        Ok(result)
    }

    /// Loads a parcel by ID.
    ///
    /// Returns None if the parcel doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn get_parcel(&self, parcel_id: AggregateId) -> Result<Option<Parcel>, DomainError> {
        self.handler.load_existing(parcel_id).await
    }

    /// Returns the parcel's raw event stream in stored order.
    pub async fn events(&self, parcel_id: AggregateId) -> Result<Vec<EventEnvelope>, DomainError> {
        Ok(self
            .handler
            .store()
            .get_events_for_aggregate(parcel_id)
            .await?)
    }

    /// Removes a parcel's stream entirely.
    ///
    /// Compensation-only: unwinds a registration whose saga could not
    /// complete. Not part of the normal lifecycle.
    #[tracing::instrument(skip(self))]
    pub async fn discard(&self, parcel_id: AggregateId) -> Result<(), DomainError> {
        self.handler.store().purge_aggregate(parcel_id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregate;
    use crate::parcel::{ParcelStatus, TransitPlan, VehicleId, WarehouseId};
    use chrono::{NaiveDate, Utc};
    use common::Location;
    use event_store::InMemoryEventStore;

    fn register_cmd(plan: TransitPlan) -> RegisterParcel {
        RegisterParcel::new(
            NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
            Location::new(52.5, 13.4),
            NaiveDate::from_ymd_opt(2024, 3, 13).unwrap(),
            Location::new(48.1, 11.6),
            plan,
        )
    }

    #[tokio::test]
    async fn register_creates_parcel() {
        let store = InMemoryEventStore::new();
        let service = ParcelService::new(store);

        let cmd = register_cmd(TransitPlan::direct(WarehouseId::new("WH-BER")));
        let parcel_id = cmd.parcel_id;

        let result = service.register(cmd).await.unwrap();

        assert_eq!(result.aggregate.id(), Some(parcel_id));
        assert_eq!(result.aggregate.status(), ParcelStatus::ToPickup);
        assert_eq!(result.events.len(), 1);
    }

    #[tokio::test]
    async fn full_single_hop_lifecycle() {
        let store = InMemoryEventStore::new();
        let service = ParcelService::new(store);

        let cmd = register_cmd(TransitPlan::direct(WarehouseId::new("WH-BER")));
        let parcel_id = cmd.parcel_id;
        service.register(cmd).await.unwrap();

        service
            .record_pickup(RecordPickup::new(
                parcel_id,
                VehicleId::new("V-1"),
                Utc::now(),
            ))
            .await
            .unwrap();

        let result = service
            .record_warehouse_arrival(RecordWarehouseArrival::new(
                parcel_id,
                WarehouseId::new("WH-BER"),
                Utc::now(),
            ))
            .await
            .unwrap();
        assert_eq!(result.aggregate.status(), ParcelStatus::InWarehouse);

        service
            .start_delivery(StartDelivery::new(
                parcel_id,
                VehicleId::new("V-2"),
                Utc::now(),
            ))
            .await
            .unwrap();

        let result = service
            .record_delivery(RecordDelivery::new(
                parcel_id,
                VehicleId::new("V-2"),
                Utc::now(),
            ))
            .await
            .unwrap();
        assert_eq!(result.aggregate.status(), ParcelStatus::Delivered);
    }

    #[tokio::test]
    async fn rejected_event_leaves_stream_length_unchanged() {
        let store = InMemoryEventStore::new();
        let service = ParcelService::new(store);

        let cmd = register_cmd(TransitPlan::direct(WarehouseId::new("WH-BER")));
        let parcel_id = cmd.parcel_id;
        service.register(cmd).await.unwrap();

        // Delivery before pickup is rejected.
        let result = service
            .record_delivery(RecordDelivery::new(
                parcel_id,
                VehicleId::new("V-1"),
                Utc::now(),
            ))
            .await;
        assert!(result.is_err());

        assert_eq!(service.events(parcel_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn get_parcel_returns_none_for_unknown() {
        let store = InMemoryEventStore::new();
        let service = ParcelService::new(store);

        let result = service.get_parcel(AggregateId::new()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn discard_removes_the_stream() {
        let store = InMemoryEventStore::new();
        let service = ParcelService::new(store);

        let cmd = register_cmd(TransitPlan::direct(WarehouseId::new("WH-BER")));
        let parcel_id = cmd.parcel_id;
        service.register(cmd).await.unwrap();

        service.discard(parcel_id).await.unwrap();

        assert!(service.get_parcel(parcel_id).await.unwrap().is_none());
        assert!(service.events(parcel_id).await.unwrap().is_empty());
    }
}
