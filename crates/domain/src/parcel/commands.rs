//! Parcel commands.

use chrono::{DateTime, NaiveDate, Utc};
use common::{AggregateId, Location};

use crate::command::Command;

use super::{JobId, Parcel, TransitPlan, VehicleId, WarehouseId};

/// Command to register a new parcel.
#[derive(Debug, Clone)]
pub struct RegisterParcel {
    /// The parcel ID to create.
    pub parcel_id: AggregateId,

    /// Scheduled pickup day.
    pub pickup_date: NaiveDate,

    /// Pickup coordinates.
    pub pickup_location: Location,

    /// Scheduled delivery day.
    pub delivery_date: NaiveDate,

    /// Delivery coordinates.
    pub delivery_location: Location,

    /// The transit plan chosen by warehouse assignment.
    pub transit_warehouses: TransitPlan,
}

impl RegisterParcel {
    /// Creates a RegisterParcel command with a generated parcel ID.
    pub fn new(
        pickup_date: NaiveDate,
        pickup_location: Location,
        delivery_date: NaiveDate,
        delivery_location: Location,
        transit_warehouses: TransitPlan,
    ) -> Self {
        Self {
            parcel_id: AggregateId::new(),
            pickup_date,
            pickup_location,
            delivery_date,
            delivery_location,
            transit_warehouses,
        }
    }
}

impl Command for RegisterParcel {
    type Aggregate = Parcel;

    fn aggregate_id(&self) -> AggregateId {
        self.parcel_id
    }
}

/// Command to record a pickup.
#[derive(Debug, Clone)]
pub struct RecordPickup {
    pub parcel_id: AggregateId,
    pub vehicle_id: VehicleId,
    /// Event time (sweep time for generated events).
    pub at: DateTime<Utc>,
}

impl RecordPickup {
    /// Creates a new RecordPickup command.
    pub fn new(parcel_id: AggregateId, vehicle_id: VehicleId, at: DateTime<Utc>) -> Self {
        Self {
            parcel_id,
            vehicle_id,
            at,
        }
    }
}

impl Command for RecordPickup {
    type Aggregate = Parcel;

    fn aggregate_id(&self) -> AggregateId {
        self.parcel_id
    }
}

/// Command to record arrival at a warehouse off the pickup vehicle.
#[derive(Debug, Clone)]
pub struct RecordWarehouseArrival {
    pub parcel_id: AggregateId,
    pub warehouse_id: WarehouseId,
    pub at: DateTime<Utc>,
}

impl RecordWarehouseArrival {
    /// Creates a new RecordWarehouseArrival command.
    pub fn new(parcel_id: AggregateId, warehouse_id: WarehouseId, at: DateTime<Utc>) -> Self {
        Self {
            parcel_id,
            warehouse_id,
            at,
        }
    }
}

impl Command for RecordWarehouseArrival {
    type Aggregate = Parcel;

    fn aggregate_id(&self) -> AggregateId {
        self.parcel_id
    }
}

/// Command to record departure on a nightly transfer.
#[derive(Debug, Clone)]
pub struct StartTransfer {
    pub parcel_id: AggregateId,
    pub transfer_job_id: JobId,
    pub destination_warehouse_id: WarehouseId,
    pub at: DateTime<Utc>,
}

impl StartTransfer {
    /// Creates a new StartTransfer command.
    pub fn new(
        parcel_id: AggregateId,
        transfer_job_id: JobId,
        destination_warehouse_id: WarehouseId,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            parcel_id,
            transfer_job_id,
            destination_warehouse_id,
            at,
        }
    }
}

impl Command for StartTransfer {
    type Aggregate = Parcel;

    fn aggregate_id(&self) -> AggregateId {
        self.parcel_id
    }
}

/// Command to record the transfer's arrival at its destination.
#[derive(Debug, Clone)]
pub struct CompleteTransfer {
    pub parcel_id: AggregateId,
    pub warehouse_id: WarehouseId,
    pub at: DateTime<Utc>,
}

impl CompleteTransfer {
    /// Creates a new CompleteTransfer command.
    pub fn new(parcel_id: AggregateId, warehouse_id: WarehouseId, at: DateTime<Utc>) -> Self {
        Self {
            parcel_id,
            warehouse_id,
            at,
        }
    }
}

impl Command for CompleteTransfer {
    type Aggregate = Parcel;

    fn aggregate_id(&self) -> AggregateId {
        self.parcel_id
    }
}

/// Command to record the start of the final delivery leg.
#[derive(Debug, Clone)]
pub struct StartDelivery {
    pub parcel_id: AggregateId,
    pub vehicle_id: VehicleId,
    pub at: DateTime<Utc>,
}

impl StartDelivery {
    /// Creates a new StartDelivery command.
    pub fn new(parcel_id: AggregateId, vehicle_id: VehicleId, at: DateTime<Utc>) -> Self {
        Self {
            parcel_id,
            vehicle_id,
            at,
        }
    }
}

impl Command for StartDelivery {
    type Aggregate = Parcel;

    fn aggregate_id(&self) -> AggregateId {
        self.parcel_id
    }
}

/// Command to record final delivery.
#[derive(Debug, Clone)]
pub struct RecordDelivery {
    pub parcel_id: AggregateId,
    pub vehicle_id: VehicleId,
    pub at: DateTime<Utc>,
}

impl RecordDelivery {
    /// Creates a new RecordDelivery command.
    pub fn new(parcel_id: AggregateId, vehicle_id: VehicleId, at: DateTime<Utc>) -> Self {
        Self {
            parcel_id,
            vehicle_id,
            at,
        }
    }
}

impl Command for RecordDelivery {
    type Aggregate = Parcel;

    fn aggregate_id(&self) -> AggregateId {
        self.parcel_id
    }
}
