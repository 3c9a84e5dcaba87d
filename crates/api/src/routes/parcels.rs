//! Parcel registration and query endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, NaiveDate, Utc};
use common::{AggregateId, Location};
use domain::RegisterParcel;
use event_store::EventStore;
use fleet::{FleetStore, Order, RouteKind, plan_transit};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::state::AppState;

#[derive(Deserialize)]
pub struct RegisterParcelRequest {
    pub pickup_date: NaiveDate,
    pub pickup_location: Location,
    pub delivery_date: NaiveDate,
    pub delivery_location: Location,
}

#[derive(Serialize)]
pub struct ParcelRegisteredResponse {
    pub parcel_id: String,
    pub transit_warehouses: Vec<String>,
}

#[derive(Serialize)]
pub struct ParcelResponse {
    pub parcel_id: String,
    pub status: String,
    pub pickup_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    pub transit_warehouses: Vec<String>,
    pub current_warehouse: Option<String>,
    pub current_vehicle: Option<String>,
}

#[derive(Serialize)]
pub struct ParcelSummaryResponse {
    pub parcel_id: String,
    pub status: String,
    pub current_warehouse: Option<String>,
    pub current_vehicle: Option<String>,
}

#[derive(Serialize)]
pub struct EventResponse {
    pub event_type: String,
    pub version: i64,
    pub timestamp: DateTime<Utc>,
    pub payload: serde_json::Value,
}

#[derive(Serialize)]
pub struct JourneyEntryResponse {
    pub event_type: String,
    pub at: DateTime<Utc>,
    pub warehouse_id: Option<String>,
    pub vehicle_id: Option<String>,
}

/// POST /parcels — registers a parcel directly (without the offer leg) and
/// queues its pickup order.
#[tracing::instrument(skip(state, req))]
pub async fn register<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<RegisterParcelRequest>,
) -> Result<(StatusCode, Json<ParcelRegisteredResponse>), ApiError> {
    let warehouses = state.fleet.available_warehouses().await?;
    let plan = plan_transit(&warehouses, req.pickup_location, req.delivery_location)?;

    let cmd = RegisterParcel::new(
        req.pickup_date,
        req.pickup_location,
        req.delivery_date,
        req.delivery_location,
        plan.clone(),
    );
    let parcel_id = cmd.parcel_id;
    state.parcels.register(cmd).await?;

    let warehouse = state
        .fleet
        .get_warehouse(plan.first())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("warehouse {} not found", plan.first())))?;
    state
        .fleet
        .put_order(Order {
            parcel_id,
            kind: RouteKind::Pickup,
            warehouse_id: warehouse.id.clone(),
            date: req.pickup_date,
            location: req.pickup_location,
            warehouse,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ParcelRegisteredResponse {
            parcel_id: parcel_id.to_string(),
            transit_warehouses: plan.warehouses().iter().map(|w| w.to_string()).collect(),
        }),
    ))
}

/// GET /parcels — lists parcels still underway.
pub async fn list<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ParcelSummaryResponse>>, ApiError> {
    state
        .processor
        .run_catch_up()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let summaries = state.current_parcels.all().await;
    Ok(Json(
        summaries
            .into_iter()
            .map(|s| ParcelSummaryResponse {
                parcel_id: s.parcel_id.to_string(),
                status: s.status.to_string(),
                current_warehouse: s.current_warehouse.map(|w| w.to_string()),
                current_vehicle: s.current_vehicle.map(|v| v.to_string()),
            })
            .collect(),
    ))
}

/// GET /parcels/{id} — the parcel's projected state, replayed from its
/// stream.
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<uuid::Uuid>,
) -> Result<Json<ParcelResponse>, ApiError> {
    let parcel_id = AggregateId::from_uuid(id);
    let parcel = state
        .parcels
        .get_parcel(parcel_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("parcel {parcel_id} not found")))?;

    Ok(Json(ParcelResponse {
        parcel_id: parcel_id.to_string(),
        status: parcel.status().to_string(),
        pickup_date: parcel.pickup_date(),
        delivery_date: parcel.delivery_date(),
        transit_warehouses: parcel
            .transit_warehouses()
            .map(|p| p.warehouses().iter().map(|w| w.to_string()).collect())
            .unwrap_or_default(),
        current_warehouse: parcel.current_warehouse().map(|w| w.to_string()),
        current_vehicle: parcel.current_vehicle().map(|v| v.to_string()),
    }))
}

/// GET /parcels/{id}/events — the raw event stream in stored order.
pub async fn events<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<uuid::Uuid>,
) -> Result<Json<Vec<EventResponse>>, ApiError> {
    let parcel_id = AggregateId::from_uuid(id);
    let envelopes = state.parcels.events(parcel_id).await?;
    if envelopes.is_empty() {
        return Err(ApiError::NotFound(format!("parcel {parcel_id} not found")));
    }

    Ok(Json(
        envelopes
            .into_iter()
            .map(|e| EventResponse {
                event_type: e.event_type,
                version: e.version.as_i64(),
                timestamp: e.timestamp,
                payload: e.payload,
            })
            .collect(),
    ))
}

/// GET /parcels/{id}/journey — the denormalized journey timeline.
pub async fn journey<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<uuid::Uuid>,
) -> Result<Json<Vec<JourneyEntryResponse>>, ApiError> {
    state
        .processor
        .run_catch_up()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let parcel_id = AggregateId::from_uuid(id);
    let entries = state.journeys.journey(parcel_id).await;
    if entries.is_empty() {
        return Err(ApiError::NotFound(format!("parcel {parcel_id} not found")));
    }

    Ok(Json(
        entries
            .into_iter()
            .map(|e| JourneyEntryResponse {
                event_type: e.event_type,
                at: e.at,
                warehouse_id: e.warehouse_id.map(|w| w.to_string()),
                vehicle_id: e.vehicle_id.map(|v| v.to_string()),
            })
            .collect(),
    ))
}
