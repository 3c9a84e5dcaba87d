//! Parcel aggregate: a shipped parcel's journey from pickup through
//! warehouses to final delivery, projected from its event stream.

mod aggregate;
mod commands;
mod events;
mod service;
mod status;
mod value_objects;

pub use aggregate::Parcel;
pub use commands::{
    CompleteTransfer, RecordDelivery, RecordPickup, RecordWarehouseArrival, RegisterParcel,
    StartDelivery, StartTransfer,
};
pub use events::{
    ParcelArrivedAtWarehouseData, ParcelDeliveredData, ParcelDeliveryStartedData, ParcelEvent,
    ParcelPickedUpData, ParcelRegisteredData, ParcelTransferCompletedData,
    ParcelTransferStartedData,
};
pub use service::ParcelService;
pub use status::ParcelStatus;
pub use value_objects::{JobId, TransitPlan, VehicleId, WarehouseId};

use thiserror::Error;

/// Errors produced by the parcel aggregate's lifecycle guards.
#[derive(Debug, Error)]
pub enum ParcelError {
    /// A registration event was issued for an already-registered parcel.
    #[error("Parcel is already registered")]
    AlreadyRegistered,

    /// The event is not valid for the parcel's current status. The event
    /// is rejected and the stream is left unchanged.
    #[error("Event {event} is not valid while parcel is {status}")]
    InvalidTransition {
        status: ParcelStatus,
        event: &'static str,
    },

    /// Delivery can only start from the last transit warehouse.
    #[error("Parcel is at {current:?} but delivery starts from {expected}")]
    NotAtFinalWarehouse {
        current: Option<WarehouseId>,
        expected: WarehouseId,
    },
}
