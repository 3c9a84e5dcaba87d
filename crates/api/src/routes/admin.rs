//! Administrative triggers: fleet seeding, job batching, the progress
//! sweep and the daily vehicle reset.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, NaiveDate, Utc};
use common::Location;
use domain::{VehicleId, WarehouseId};
use event_store::EventStore;
use fleet::{
    DAILY_VEHICLE_CAPACITY_SECS, FleetStore, RouteKind, Vehicle, Warehouse, WarehouseStatus,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::state::AppState;

#[derive(Deserialize)]
pub struct PutWarehouseRequest {
    pub id: String,
    pub location: Location,
    pub city_codename: String,
    pub range_km: Option<f64>,
}

#[derive(Deserialize)]
pub struct PutVehicleRequest {
    pub id: String,
    pub warehouse_id: String,
    pub kind: RouteKind,
}

#[derive(Deserialize)]
pub struct PrepareJobsRequest {
    pub warehouse_id: String,
    pub date: NaiveDate,
}

#[derive(Serialize)]
pub struct PrepareJobsResponse {
    pub pickup_jobs: usize,
    pub delivery_jobs: usize,
}

#[derive(Deserialize, Default)]
pub struct AdvanceJobsRequest {
    /// Sweep time; defaults to now.
    pub at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct AdvanceJobsResponse {
    pub vehicles_swept: usize,
    pub transfers_swept: usize,
    pub events_emitted: usize,
}

/// POST /admin/warehouses — inserts or replaces a warehouse record.
#[tracing::instrument(skip(state, req))]
pub async fn put_warehouse<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<PutWarehouseRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .fleet
        .put_warehouse(Warehouse {
            id: WarehouseId::new(req.id),
            location: req.location,
            city_codename: req.city_codename,
            range_km: req.range_km,
            status: WarehouseStatus::Available,
        })
        .await?;
    Ok(StatusCode::CREATED)
}

/// POST /admin/vehicles — inserts or replaces a vehicle at full capacity.
#[tracing::instrument(skip(state, req))]
pub async fn put_vehicle<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<PutVehicleRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .fleet
        .put_vehicle(Vehicle {
            id: VehicleId::new(req.id),
            warehouse_id: WarehouseId::new(req.warehouse_id),
            kind: req.kind,
            capacity_secs: DAILY_VEHICLE_CAPACITY_SECS,
        })
        .await?;
    Ok(StatusCode::CREATED)
}

/// POST /admin/vehicles/reset — the "new day" trigger restoring every
/// vehicle to the daily maximum.
#[tracing::instrument(skip(state))]
pub async fn reset_vehicles<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<StatusCode, ApiError> {
    state
        .orchestrator
        .reset_vehicles(DAILY_VEHICLE_CAPACITY_SECS)
        .await?;
    Ok(StatusCode::OK)
}

/// POST /admin/jobs/prepare — batches pending pickup and delivery orders
/// for a warehouse and date into vehicle jobs.
#[tracing::instrument(skip(state, req))]
pub async fn prepare_jobs<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<PrepareJobsRequest>,
) -> Result<Json<PrepareJobsResponse>, ApiError> {
    let warehouse_id = WarehouseId::new(req.warehouse_id);

    let pickup_jobs = state
        .orchestrator
        .create_pickup_jobs(&warehouse_id, req.date)
        .await?;
    let delivery_jobs = state
        .orchestrator
        .create_delivery_jobs(&warehouse_id, req.date)
        .await?;

    Ok(Json(PrepareJobsResponse {
        pickup_jobs: pickup_jobs.len(),
        delivery_jobs: delivery_jobs.len(),
    }))
}

/// POST /admin/jobs/advance — runs one progress sweep.
#[tracing::instrument(skip(state, req))]
pub async fn advance_jobs<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<AdvanceJobsRequest>,
) -> Result<Json<AdvanceJobsResponse>, ApiError> {
    let now = req.at.unwrap_or_else(Utc::now);
    let report = state.generator.sweep(now).await?;

    Ok(Json(AdvanceJobsResponse {
        vehicles_swept: report.vehicles_swept,
        transfers_swept: report.transfers_swept,
        events_emitted: report.events_emitted,
    }))
}
