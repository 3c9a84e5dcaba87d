//! Vehicle tracking endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use domain::VehicleId;
use event_store::EventStore;
use serde::Serialize;

use crate::error::ApiError;
use crate::routes::state::AppState;

#[derive(Serialize)]
pub struct VehicleLocationResponse {
    pub vehicle_id: String,
    pub lat: f64,
    pub lon: f64,
    pub at: DateTime<Utc>,
}

/// GET /vehicles/{id}/location — the vehicle's last tracked position.
pub async fn location<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<VehicleLocationResponse>, ApiError> {
    let vehicle_id = VehicleId::new(id);
    let position = state
        .tracker
        .position(&vehicle_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("no position tracked for {vehicle_id}")))?;

    Ok(Json(VehicleLocationResponse {
        vehicle_id: vehicle_id.to_string(),
        lat: position.location.lat,
        lon: position.location.lon,
        at: position.at,
    }))
}
