use common::AggregateId;
use domain::{DomainError, VehicleId, WarehouseId};
use fleet::{FleetError, RouteKind};
use thiserror::Error;

/// Errors that can occur in the dispatch layer.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The route optimizer failed or was unreachable. Fatal for the
    /// current batch; no partial progress is retained for that page.
    #[error("Route optimizer error: {0}")]
    Optimizer(String),

    /// Orders remain for the warehouse and date but no vehicle of the
    /// matching kind has capacity left. Deliberate fail-fast: this is an
    /// operational escalation point, not something to retry silently.
    #[error("No {kind} vehicles available at warehouse {warehouse_id}")]
    NoVehiclesAvailable {
        warehouse_id: WarehouseId,
        kind: RouteKind,
    },

    /// A vehicle has more than one job in progress - an invariant
    /// violation the sweep must surface instead of guessing.
    #[error("Vehicle {0} has more than one job in progress")]
    MultipleActiveJobs(VehicleId),

    /// The parcel's projected state is missing the data arrival routing
    /// needs (no transit plan, no delivery parameters).
    #[error("Parcel {0} cannot be routed from its current state")]
    ParcelNotRoutable(AggregateId),

    /// Fleet record store error.
    #[error("Fleet error: {0}")]
    Fleet(#[from] FleetError),

    /// Domain error while emitting lifecycle events.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

/// Result type for dispatch operations.
pub type Result<T> = std::result::Result<T, DispatchError>;
