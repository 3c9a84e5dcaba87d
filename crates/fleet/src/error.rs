use common::Location;
use domain::{JobId, VehicleId, WarehouseId};
use thiserror::Error;

/// Errors that can occur when working with fleet records.
#[derive(Debug, Error)]
pub enum FleetError {
    /// The referenced warehouse does not exist.
    #[error("Warehouse not found: {0}")]
    WarehouseNotFound(WarehouseId),

    /// The referenced vehicle does not exist.
    #[error("Vehicle not found: {0}")]
    VehicleNotFound(VehicleId),

    /// The referenced job does not exist.
    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    /// The referenced transfer job does not exist.
    #[error("Transfer job not found: {0}")]
    TransferJobNotFound(JobId),

    /// No available warehouse serves the given point within its own range.
    #[error("No warehouse in range of {0}")]
    NoWarehouseInRange(Location),
}

/// Result type for fleet operations.
pub type Result<T> = std::result::Result<T, FleetError>;
