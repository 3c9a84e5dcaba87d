//! Domain layer for the parcel system.
//!
//! This crate provides the core domain abstractions:
//! - Aggregate and DomainEvent traits for event-sourced entities
//! - CommandHandler for the load/decide/append cycle
//! - The Parcel aggregate: a seven-state lifecycle machine projected from
//!   an append-only event stream

pub mod aggregate;
pub mod command;
pub mod error;
pub mod parcel;

pub use aggregate::{Aggregate, DomainEvent, SnapshotCapable};
pub use command::{Command, CommandHandler, CommandResult};
pub use error::DomainError;
pub use parcel::{
    CompleteTransfer, JobId, Parcel, ParcelError, ParcelEvent, ParcelService, ParcelStatus,
    RecordDelivery, RecordPickup, RecordWarehouseArrival, RegisterParcel, StartDelivery,
    StartTransfer, TransitPlan, VehicleId, WarehouseId,
};
