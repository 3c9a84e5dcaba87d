//! Parcel aggregate implementation.

use chrono::{DateTime, NaiveDate, Utc};
use common::{AggregateId, Location};
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, SnapshotCapable};

use super::{
    JobId, ParcelError, ParcelEvent, ParcelStatus, TransitPlan, VehicleId, WarehouseId,
    events::{
        ParcelArrivedAtWarehouseData, ParcelDeliveredData, ParcelDeliveryStartedData,
        ParcelPickedUpData, ParcelRegisteredData, ParcelTransferCompletedData,
        ParcelTransferStartedData,
    },
};

/// Parcel aggregate root.
///
/// All fields are projections of the parcel's event stream; replaying the
/// stream from an empty aggregate always reproduces them. Journey
/// parameters (dates, locations, transit plan) are set once by
/// registration and never change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Parcel {
    /// Unique parcel identifier.
    id: Option<AggregateId>,

    /// Current version for optimistic concurrency.
    #[serde(default)]
    version: Version,

    /// Current lifecycle status.
    status: ParcelStatus,

    /// Scheduled pickup day.
    pickup_date: Option<NaiveDate>,

    /// Pickup coordinates.
    pickup_location: Option<Location>,

    /// Scheduled delivery day.
    delivery_date: Option<NaiveDate>,

    /// Delivery coordinates.
    delivery_location: Option<Location>,

    /// The warehouses the parcel passes through.
    transit_warehouses: Option<TransitPlan>,

    /// The warehouse currently holding the parcel, if any.
    current_warehouse: Option<WarehouseId>,

    /// The vehicle currently carrying the parcel, if any.
    current_vehicle: Option<VehicleId>,
}

impl Aggregate for Parcel {
    type Event = ParcelEvent;
    type Error = ParcelError;

    fn aggregate_type() -> &'static str {
        "Parcel"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            ParcelEvent::ParcelRegistered(data) => self.apply_registered(data),
            ParcelEvent::ParcelPickedUp(data) => self.apply_picked_up(data),
            ParcelEvent::ParcelArrivedAtWarehouse(data) => self.apply_warehouse_arrival(data),
            ParcelEvent::ParcelTransferStarted(data) => self.apply_transfer_started(data),
            ParcelEvent::ParcelTransferCompleted(data) => self.apply_transfer_completed(data),
            ParcelEvent::ParcelDeliveryStarted(data) => self.apply_delivery_started(data),
            ParcelEvent::ParcelDelivered(data) => self.apply_delivered(data),
        }
    }
}

impl SnapshotCapable for Parcel {
    fn snapshot_interval() -> usize {
        // Parcel streams are short (seven events at most in a normal life),
        // so this only matters for pathological replays.
        50
    }
}

// Query methods
impl Parcel {
    /// Returns the current lifecycle status.
    pub fn status(&self) -> ParcelStatus {
        self.status
    }

    /// Returns the scheduled pickup day.
    pub fn pickup_date(&self) -> Option<NaiveDate> {
        self.pickup_date
    }

    /// Returns the pickup coordinates.
    pub fn pickup_location(&self) -> Option<Location> {
        self.pickup_location
    }

    /// Returns the scheduled delivery day.
    pub fn delivery_date(&self) -> Option<NaiveDate> {
        self.delivery_date
    }

    /// Returns the delivery coordinates.
    pub fn delivery_location(&self) -> Option<Location> {
        self.delivery_location
    }

    /// Returns the transit plan fixed at registration.
    pub fn transit_warehouses(&self) -> Option<&TransitPlan> {
        self.transit_warehouses.as_ref()
    }

    /// Returns the warehouse currently holding the parcel.
    pub fn current_warehouse(&self) -> Option<&WarehouseId> {
        self.current_warehouse.as_ref()
    }

    /// Returns the vehicle currently carrying the parcel.
    pub fn current_vehicle(&self) -> Option<&VehicleId> {
        self.current_vehicle.as_ref()
    }

    /// Returns true if the parcel has reached its terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// Command methods (validate, then return events)
impl Parcel {
    /// Registers a new parcel with its immutable journey parameters.
    #[allow(clippy::too_many_arguments)]
    pub fn register(
        &self,
        parcel_id: AggregateId,
        pickup_date: NaiveDate,
        pickup_location: Location,
        delivery_date: NaiveDate,
        delivery_location: Location,
        transit_warehouses: TransitPlan,
        at: DateTime<Utc>,
    ) -> Result<Vec<ParcelEvent>, ParcelError> {
        if self.id.is_some() {
            return Err(ParcelError::AlreadyRegistered);
        }

        Ok(vec![ParcelEvent::registered(
            parcel_id,
            pickup_date,
            pickup_location,
            delivery_date,
            delivery_location,
            transit_warehouses,
            at,
        )])
    }

    /// Records the pickup by a vehicle.
    pub fn record_pickup(
        &self,
        vehicle_id: VehicleId,
        at: DateTime<Utc>,
    ) -> Result<Vec<ParcelEvent>, ParcelError> {
        if !self.status.can_pick_up() {
            return Err(ParcelError::InvalidTransition {
                status: self.status,
                event: "ParcelPickedUp",
            });
        }

        Ok(vec![ParcelEvent::picked_up(vehicle_id, at)])
    }

    /// Records arrival at a warehouse off the pickup vehicle.
    pub fn record_warehouse_arrival(
        &self,
        warehouse_id: WarehouseId,
        at: DateTime<Utc>,
    ) -> Result<Vec<ParcelEvent>, ParcelError> {
        if !self.status.can_arrive_at_warehouse() {
            return Err(ParcelError::InvalidTransition {
                status: self.status,
                event: "ParcelArrivedAtWarehouse",
            });
        }

        Ok(vec![ParcelEvent::arrived_at_warehouse(warehouse_id, at)])
    }

    /// Records departure on a nightly transfer.
    pub fn start_transfer(
        &self,
        transfer_job_id: JobId,
        destination_warehouse_id: WarehouseId,
        at: DateTime<Utc>,
    ) -> Result<Vec<ParcelEvent>, ParcelError> {
        if !self.status.can_start_transfer() {
            return Err(ParcelError::InvalidTransition {
                status: self.status,
                event: "ParcelTransferStarted",
            });
        }

        Ok(vec![ParcelEvent::transfer_started(
            transfer_job_id,
            destination_warehouse_id,
            at,
        )])
    }

    /// Records the transfer's arrival at its destination warehouse.
    pub fn complete_transfer(
        &self,
        warehouse_id: WarehouseId,
        at: DateTime<Utc>,
    ) -> Result<Vec<ParcelEvent>, ParcelError> {
        if !self.status.can_complete_transfer() {
            return Err(ParcelError::InvalidTransition {
                status: self.status,
                event: "ParcelTransferCompleted",
            });
        }

        Ok(vec![ParcelEvent::transfer_completed(warehouse_id, at)])
    }

    /// Records the start of the final delivery leg.
    ///
    /// Only valid at the last transit warehouse: a parcel still waiting for
    /// a transfer hop cannot go out for delivery.
    pub fn start_delivery(
        &self,
        vehicle_id: VehicleId,
        at: DateTime<Utc>,
    ) -> Result<Vec<ParcelEvent>, ParcelError> {
        if !self.status.can_start_delivery() {
            return Err(ParcelError::InvalidTransition {
                status: self.status,
                event: "ParcelDeliveryStarted",
            });
        }

        if let Some(plan) = &self.transit_warehouses
            && self.current_warehouse.as_ref() != Some(plan.last())
        {
            return Err(ParcelError::NotAtFinalWarehouse {
                current: self.current_warehouse.clone(),
                expected: plan.last().clone(),
            });
        }

        Ok(vec![ParcelEvent::delivery_started(vehicle_id, at)])
    }

    /// Records final delivery to the customer.
    pub fn record_delivery(
        &self,
        vehicle_id: VehicleId,
        at: DateTime<Utc>,
    ) -> Result<Vec<ParcelEvent>, ParcelError> {
        if !self.status.can_deliver() {
            return Err(ParcelError::InvalidTransition {
                status: self.status,
                event: "ParcelDelivered",
            });
        }

        Ok(vec![ParcelEvent::delivered(vehicle_id, at)])
    }
}

// Apply event helpers
impl Parcel {
    fn apply_registered(&mut self, data: ParcelRegisteredData) {
        self.id = Some(data.parcel_id);
        self.pickup_date = Some(data.pickup_date);
        self.pickup_location = Some(data.pickup_location);
        self.delivery_date = Some(data.delivery_date);
        self.delivery_location = Some(data.delivery_location);
        self.transit_warehouses = Some(data.transit_warehouses);
        self.status = ParcelStatus::ToPickup;
    }

    fn apply_picked_up(&mut self, data: ParcelPickedUpData) {
        self.status = ParcelStatus::TransitToWarehouse;
        self.current_vehicle = Some(data.vehicle_id);
        self.current_warehouse = None;
    }

    fn apply_warehouse_arrival(&mut self, data: ParcelArrivedAtWarehouseData) {
        self.status = self.status_after_arrival(&data.warehouse_id);
        self.current_warehouse = Some(data.warehouse_id);
        self.current_vehicle = None;
    }

    fn apply_transfer_started(&mut self, _data: ParcelTransferStartedData) {
        self.status = ParcelStatus::Transfer;
        self.current_warehouse = None;
    }

    fn apply_transfer_completed(&mut self, data: ParcelTransferCompletedData) {
        self.status = self.status_after_arrival(&data.warehouse_id);
        self.current_warehouse = Some(data.warehouse_id);
    }

    fn apply_delivery_started(&mut self, data: ParcelDeliveryStartedData) {
        self.status = ParcelStatus::TransitToCustomer;
        self.current_vehicle = Some(data.vehicle_id);
        self.current_warehouse = None;
    }

    fn apply_delivered(&mut self, _data: ParcelDeliveredData) {
        self.status = ParcelStatus::Delivered;
        self.current_vehicle = None;
    }

    /// An arrival at the plan's last warehouse waits for delivery; an
    /// arrival with hops remaining waits for the next transfer.
    fn status_after_arrival(&self, warehouse_id: &WarehouseId) -> ParcelStatus {
        match &self.transit_warehouses {
            Some(plan) if !plan.is_final(warehouse_id) => ParcelStatus::ToTransfer,
            _ => ParcelStatus::InWarehouse,
        }
    }
}
