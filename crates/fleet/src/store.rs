//! The keyed record store trait.

use async_trait::async_trait;
use chrono::NaiveDate;
use common::AggregateId;
use domain::{JobId, VehicleId, WarehouseId};

use crate::Result;
use crate::records::{Job, Order, RouteKind, TransferJob, Vehicle, Warehouse};

/// The write set of one job-batching round, applied all-or-nothing.
///
/// Partial application would double-spend vehicle capacity or leave
/// orphaned jobs, so the store must treat this as a single transaction.
#[derive(Debug, Default)]
pub struct JobBatch {
    /// New jobs to insert.
    pub jobs: Vec<Job>,

    /// Route-seconds to subtract from each used vehicle.
    pub capacity_decrements: Vec<(VehicleId, i64)>,

    /// Orders consumed by the batch, keyed by `(parcel, direction)`.
    pub consumed_orders: Vec<(AggregateId, RouteKind)>,
}

/// Keyed record store for fleet state.
///
/// Plain get-by-key / query-by-secondary-index / bounded-scan access plus
/// one atomic multi-record write ([`JobBatch`]). Parcels do NOT live here;
/// they are owned by their event streams.
#[async_trait]
pub trait FleetStore: Send + Sync {
    // -- Warehouses --

    /// Inserts or replaces a warehouse record.
    async fn put_warehouse(&self, warehouse: Warehouse) -> Result<()>;

    /// Looks up a warehouse by ID.
    async fn get_warehouse(&self, id: &WarehouseId) -> Result<Option<Warehouse>>;

    /// Returns all warehouses currently available for routing.
    async fn available_warehouses(&self) -> Result<Vec<Warehouse>>;

    // -- Vehicles --

    /// Inserts or replaces a vehicle record.
    async fn put_vehicle(&self, vehicle: Vehicle) -> Result<()>;

    /// Looks up a vehicle by ID.
    async fn get_vehicle(&self, id: &VehicleId) -> Result<Option<Vehicle>>;

    /// Returns up to `limit` vehicles of the given kind stationed at the
    /// warehouse with remaining capacity of at least `min_capacity_secs`.
    async fn available_vehicles(
        &self,
        warehouse_id: &WarehouseId,
        kind: RouteKind,
        min_capacity_secs: i64,
        limit: usize,
    ) -> Result<Vec<Vehicle>>;

    /// Resets every vehicle's capacity to the given value (the "new day"
    /// trigger).
    async fn reset_vehicle_capacities(&self, capacity_secs: i64) -> Result<()>;

    // -- Orders --

    /// Inserts or replaces a pending order.
    async fn put_order(&self, order: Order) -> Result<()>;

    /// Returns up to `limit` pending orders for the warehouse, date and
    /// direction. Bounded page; callers loop until it comes back empty.
    async fn pending_orders(
        &self,
        warehouse_id: &WarehouseId,
        date: NaiveDate,
        kind: RouteKind,
        limit: usize,
    ) -> Result<Vec<Order>>;

    // -- Jobs --

    /// Looks up a job by ID.
    async fn get_job(&self, id: JobId) -> Result<Option<Job>>;

    /// Inserts or replaces a job record (status/step updates).
    async fn put_job(&self, job: Job) -> Result<()>;

    /// Returns all jobs assigned to the vehicle.
    async fn jobs_for_vehicle(&self, vehicle_id: &VehicleId) -> Result<Vec<Job>>;

    // -- Transfer jobs --

    /// Looks up a transfer job by ID.
    async fn get_transfer_job(&self, id: JobId) -> Result<Option<TransferJob>>;

    /// Inserts or replaces a transfer job record.
    async fn put_transfer_job(&self, job: TransferJob) -> Result<()>;

    /// Finds the pending transfer job for a connection+date pair, if one
    /// exists. The pair is unique by construction (lookup-before-create).
    async fn find_pending_transfer(
        &self,
        connection: &str,
        date: NaiveDate,
    ) -> Result<Option<TransferJob>>;

    // -- Atomic batch --

    /// Applies a job batch as one transaction: decrement capacities, insert
    /// jobs, delete consumed orders. Either everything lands or nothing
    /// does.
    async fn commit_job_batch(&self, batch: JobBatch) -> Result<()>;
}
