//! Fleet record types.
//!
//! These are plain keyed records, not event-sourced aggregates: warehouses
//! are read-mostly reference data, vehicles carry a mutable daily capacity,
//! orders are ephemeral (deleted once folded into a job), and jobs are the
//! units of work the progress generator advances.

use chrono::NaiveDate;
use common::{AggregateId, Location};
use domain::{JobId, VehicleId, WarehouseId};
use serde::{Deserialize, Serialize};

/// Full working day of route-seconds a vehicle gets at the daily reset.
pub const DAILY_VEHICLE_CAPACITY_SECS: i64 = 8 * 3600;

/// Whether a warehouse currently takes part in routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarehouseStatus {
    Available,
    Closed,
}

/// A warehouse: reference data with a service radius.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub location: Location,
    pub city_codename: String,
    /// Service radius in km. None means the warehouse serves any distance.
    pub range_km: Option<f64>,
    pub status: WarehouseStatus,
}

impl Warehouse {
    /// Returns true if the point lies within this warehouse's own service
    /// radius.
    pub fn covers(&self, point: &Location) -> bool {
        match self.range_km {
            Some(range) => self.location.distance_km(point) <= range,
            None => true,
        }
    }
}

/// Direction of a route: collecting parcels or delivering them.
///
/// Vehicles are dedicated to one direction; orders and jobs carry the same
/// tag so batching only ever pairs like with like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteKind {
    Pickup,
    Delivery,
}

impl RouteKind {
    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteKind::Pickup => "PICKUP",
            RouteKind::Delivery => "DELIVERY",
        }
    }
}

impl std::fmt::Display for RouteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A vehicle stationed at a warehouse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub warehouse_id: WarehouseId,
    pub kind: RouteKind,
    /// Remaining route-seconds for the day. Decremented when a job is
    /// committed, restored by the daily reset.
    pub capacity_secs: i64,
}

/// A pending pickup or delivery order.
///
/// Created when a parcel needs its next hop scheduled; deleted in the same
/// transaction that folds it into a job. Keyed by `(parcel_id, kind)` - a
/// parcel has at most one pending order per direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub parcel_id: AggregateId,
    pub kind: RouteKind,
    pub warehouse_id: WarehouseId,
    pub date: NaiveDate,
    pub location: Location,
    /// Denormalized warehouse snapshot taken when the order was created.
    pub warehouse: Warehouse,
}

impl Order {
    /// The record key: one pending order per parcel and direction.
    pub fn key(&self) -> (AggregateId, RouteKind) {
        (self.parcel_id, self.kind)
    }
}

/// Progress state shared by vehicle jobs and transfer jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
}

impl JobStatus {
    /// Returns true if the job still needs sweeping.
    pub fn is_open(&self) -> bool {
        !matches!(self, JobStatus::Completed)
    }
}

/// One stop on a vehicle's route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStep {
    pub location: Location,
    /// Scheduled arrival as an offset in seconds from the job start.
    pub arrival_offset_secs: i64,
    pub parcel_id: AggregateId,
}

/// One vehicle's route for one day, produced in bulk by the optimizer.
///
/// Steps are ordered by ascending arrival offset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub kind: RouteKind,
    pub status: JobStatus,
    pub date: NaiveDate,
    pub warehouse_id: WarehouseId,
    pub vehicle_id: VehicleId,
    /// Total route duration in seconds, including the return leg.
    pub duration_secs: i64,
    pub steps: Vec<JobStep>,
}

/// One nightly inter-warehouse trip.
///
/// All parcels queued for the same connection on the same date share one
/// transfer job; the parcel list only ever grows while the job is pending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferJob {
    pub id: JobId,
    pub status: JobStatus,
    pub date: NaiveDate,
    pub source_warehouse_id: WarehouseId,
    pub destination_warehouse_id: WarehouseId,
    /// Coalescing key: `<source>-<destination>`.
    pub connection: String,
    pub parcel_ids: Vec<AggregateId>,
}

impl TransferJob {
    /// Builds the coalescing key for a source/destination pair.
    pub fn connection_key(source: &WarehouseId, destination: &WarehouseId) -> String {
        format!("{source}-{destination}")
    }
}
