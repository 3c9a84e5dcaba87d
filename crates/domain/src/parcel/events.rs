//! Parcel lifecycle events.

use chrono::{DateTime, NaiveDate, Utc};
use common::{AggregateId, Location};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::{JobId, TransitPlan, VehicleId, WarehouseId};

/// Events that can occur on a parcel aggregate, one per lifecycle
/// transition. The projector matches exhaustively, so adding a variant
/// forces every consumer to handle it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ParcelEvent {
    /// Parcel was registered with its immutable journey parameters.
    ParcelRegistered(ParcelRegisteredData),

    /// A pickup vehicle collected the parcel.
    ParcelPickedUp(ParcelPickedUpData),

    /// The pickup vehicle handed the parcel to a warehouse.
    ParcelArrivedAtWarehouse(ParcelArrivedAtWarehouseData),

    /// The parcel left on a nightly inter-warehouse transfer.
    ParcelTransferStarted(ParcelTransferStartedData),

    /// The transfer arrived at its destination warehouse.
    ParcelTransferCompleted(ParcelTransferCompletedData),

    /// A delivery vehicle left the warehouse with the parcel.
    ParcelDeliveryStarted(ParcelDeliveryStartedData),

    /// The parcel reached the customer.
    ParcelDelivered(ParcelDeliveredData),
}

impl DomainEvent for ParcelEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ParcelEvent::ParcelRegistered(_) => "ParcelRegistered",
            ParcelEvent::ParcelPickedUp(_) => "ParcelPickedUp",
            ParcelEvent::ParcelArrivedAtWarehouse(_) => "ParcelArrivedAtWarehouse",
            ParcelEvent::ParcelTransferStarted(_) => "ParcelTransferStarted",
            ParcelEvent::ParcelTransferCompleted(_) => "ParcelTransferCompleted",
            ParcelEvent::ParcelDeliveryStarted(_) => "ParcelDeliveryStarted",
            ParcelEvent::ParcelDelivered(_) => "ParcelDelivered",
        }
    }
}

/// Data for ParcelRegistered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParcelRegisteredData {
    /// The new parcel's ID.
    pub parcel_id: AggregateId,

    /// Scheduled pickup day.
    pub pickup_date: NaiveDate,

    /// Where the parcel is collected.
    pub pickup_location: Location,

    /// Scheduled delivery day.
    pub delivery_date: NaiveDate,

    /// Where the parcel is delivered.
    pub delivery_location: Location,

    /// The warehouses the parcel passes through, fixed at registration.
    pub transit_warehouses: TransitPlan,

    /// When the registration was recorded.
    pub registered_at: DateTime<Utc>,
}

/// Data for ParcelPickedUp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParcelPickedUpData {
    /// The vehicle that collected the parcel.
    pub vehicle_id: VehicleId,

    /// When the pickup happened.
    pub picked_up_at: DateTime<Utc>,
}

/// Data for ParcelArrivedAtWarehouse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParcelArrivedAtWarehouseData {
    /// The warehouse that received the parcel.
    pub warehouse_id: WarehouseId,

    /// When the parcel arrived.
    pub arrived_at: DateTime<Utc>,
}

/// Data for ParcelTransferStarted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParcelTransferStartedData {
    /// The nightly transfer job carrying the parcel.
    pub transfer_job_id: JobId,

    /// Where the transfer is headed.
    pub destination_warehouse_id: WarehouseId,

    /// When the transfer left.
    pub started_at: DateTime<Utc>,
}

/// Data for ParcelTransferCompleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParcelTransferCompletedData {
    /// The warehouse the transfer arrived at.
    pub warehouse_id: WarehouseId,

    /// When the transfer arrived.
    pub completed_at: DateTime<Utc>,
}

/// Data for ParcelDeliveryStarted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParcelDeliveryStartedData {
    /// The vehicle delivering the parcel.
    pub vehicle_id: VehicleId,

    /// When the delivery leg started.
    pub started_at: DateTime<Utc>,
}

/// Data for ParcelDelivered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParcelDeliveredData {
    /// The vehicle that completed the delivery.
    pub vehicle_id: VehicleId,

    /// When the parcel reached the customer.
    pub delivered_at: DateTime<Utc>,
}

// Convenience constructors. Timestamps are passed in explicitly because the
// progress generator emits events at simulated sweep times, not the wall
// clock of the emitting process.
impl ParcelEvent {
    /// Creates a ParcelRegistered event.
    #[allow(clippy::too_many_arguments)]
    pub fn registered(
        parcel_id: AggregateId,
        pickup_date: NaiveDate,
        pickup_location: Location,
        delivery_date: NaiveDate,
        delivery_location: Location,
        transit_warehouses: TransitPlan,
        registered_at: DateTime<Utc>,
    ) -> Self {
        ParcelEvent::ParcelRegistered(ParcelRegisteredData {
            parcel_id,
            pickup_date,
            pickup_location,
            delivery_date,
            delivery_location,
            transit_warehouses,
            registered_at,
        })
    }

    /// Creates a ParcelPickedUp event.
    pub fn picked_up(vehicle_id: VehicleId, picked_up_at: DateTime<Utc>) -> Self {
        ParcelEvent::ParcelPickedUp(ParcelPickedUpData {
            vehicle_id,
            picked_up_at,
        })
    }

    /// Creates a ParcelArrivedAtWarehouse event.
    pub fn arrived_at_warehouse(warehouse_id: WarehouseId, arrived_at: DateTime<Utc>) -> Self {
        ParcelEvent::ParcelArrivedAtWarehouse(ParcelArrivedAtWarehouseData {
            warehouse_id,
            arrived_at,
        })
    }

    /// Creates a ParcelTransferStarted event.
    pub fn transfer_started(
        transfer_job_id: JobId,
        destination_warehouse_id: WarehouseId,
        started_at: DateTime<Utc>,
    ) -> Self {
        ParcelEvent::ParcelTransferStarted(ParcelTransferStartedData {
            transfer_job_id,
            destination_warehouse_id,
            started_at,
        })
    }

    /// Creates a ParcelTransferCompleted event.
    pub fn transfer_completed(warehouse_id: WarehouseId, completed_at: DateTime<Utc>) -> Self {
        ParcelEvent::ParcelTransferCompleted(ParcelTransferCompletedData {
            warehouse_id,
            completed_at,
        })
    }

    /// Creates a ParcelDeliveryStarted event.
    pub fn delivery_started(vehicle_id: VehicleId, started_at: DateTime<Utc>) -> Self {
        ParcelEvent::ParcelDeliveryStarted(ParcelDeliveryStartedData {
            vehicle_id,
            started_at,
        })
    }

    /// Creates a ParcelDelivered event.
    pub fn delivered(vehicle_id: VehicleId, delivered_at: DateTime<Utc>) -> Self {
        ParcelEvent::ParcelDelivered(ParcelDeliveredData {
            vehicle_id,
            delivered_at,
        })
    }
}
