//! Operational records for the parcel system - warehouses, vehicles,
//! pickup/delivery orders, vehicle jobs and nightly transfer jobs - plus
//! the keyed record store they live in and the warehouse assignment rule
//! that picks a parcel's transit plan at registration.

pub mod assignment;
pub mod error;
pub mod memory;
pub mod records;
pub mod store;

pub use assignment::plan_transit;
pub use error::{FleetError, Result};
pub use memory::InMemoryFleetStore;
pub use records::{
    Job, JobStatus, JobStep, Order, RouteKind, TransferJob, Vehicle, Warehouse, WarehouseStatus,
    DAILY_VEHICLE_CAPACITY_SECS,
};
pub use store::{FleetStore, JobBatch};
