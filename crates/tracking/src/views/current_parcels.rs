//! Current parcels read model - parcels still underway.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use common::AggregateId;
use domain::{ParcelEvent, ParcelStatus, VehicleId, WarehouseId};
use event_store::EventEnvelope;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// Denormalized summary of a parcel underway.
#[derive(Debug, Clone)]
pub struct ParcelSummary {
    pub parcel_id: AggregateId,
    pub status: ParcelStatus,
    pub pickup_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    pub current_warehouse: Option<WarehouseId>,
    pub current_vehicle: Option<VehicleId>,
    pub registered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Read model view of parcels that have not yet been delivered.
///
/// Parcels drop out of this view when they reach the terminal status.
#[derive(Clone)]
pub struct CurrentParcelsView {
    parcels: Arc<RwLock<HashMap<AggregateId, ParcelSummary>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl CurrentParcelsView {
    /// Creates a new empty view.
    pub fn new() -> Self {
        Self {
            parcels: Arc::new(RwLock::new(HashMap::new())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    /// Gets the summary of one parcel, if it is still underway.
    pub async fn get(&self, parcel_id: AggregateId) -> Option<ParcelSummary> {
        self.parcels.read().await.get(&parcel_id).cloned()
    }

    /// Gets all parcels underway.
    pub async fn all(&self) -> Vec<ParcelSummary> {
        self.parcels.read().await.values().cloned().collect()
    }

    /// Gets parcels underway filtered by status.
    pub async fn by_status(&self, status: ParcelStatus) -> Vec<ParcelSummary> {
        self.parcels
            .read()
            .await
            .values()
            .filter(|p| p.status == status)
            .cloned()
            .collect()
    }

    /// Number of parcels underway.
    pub async fn len(&self) -> usize {
        self.parcels.read().await.len()
    }

    /// Returns true if no parcel is underway.
    pub async fn is_empty(&self) -> bool {
        self.parcels.read().await.is_empty()
    }
}

impl Default for CurrentParcelsView {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadModel for CurrentParcelsView {
    fn name(&self) -> &'static str {
        "CurrentParcelsView"
    }
}

#[async_trait]
impl Projection for CurrentParcelsView {
    fn name(&self) -> &'static str {
        "CurrentParcelsView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        {
            let mut pos = self.position.write().await;
            *pos = pos.advance();
        }

        if event.aggregate_type != "Parcel" {
            return Ok(());
        }

        let parcel_event: ParcelEvent = serde_json::from_value(event.payload.clone())?;
        let parcel_id = event.aggregate_id;
        let mut parcels = self.parcels.write().await;

        match parcel_event {
            ParcelEvent::ParcelRegistered(data) => {
                parcels.insert(
                    parcel_id,
                    ParcelSummary {
                        parcel_id,
                        status: ParcelStatus::ToPickup,
                        pickup_date: Some(data.pickup_date),
                        delivery_date: Some(data.delivery_date),
                        current_warehouse: None,
                        current_vehicle: None,
                        registered_at: data.registered_at,
                        updated_at: data.registered_at,
                    },
                );
            }
            ParcelEvent::ParcelPickedUp(data) => {
                if let Some(summary) = parcels.get_mut(&parcel_id) {
                    summary.status = ParcelStatus::TransitToWarehouse;
                    summary.current_vehicle = Some(data.vehicle_id);
                    summary.current_warehouse = None;
                    summary.updated_at = data.picked_up_at;
                }
            }
            ParcelEvent::ParcelArrivedAtWarehouse(data) => {
                if let Some(summary) = parcels.get_mut(&parcel_id) {
                    // The envelope does not carry the transit plan, so the
                    // view leans on the next event to disambiguate: an
                    // arrival is InWarehouse until a transfer start says
                    // otherwise.
                    summary.status = ParcelStatus::InWarehouse;
                    summary.current_warehouse = Some(data.warehouse_id);
                    summary.current_vehicle = None;
                    summary.updated_at = data.arrived_at;
                }
            }
            ParcelEvent::ParcelTransferStarted(data) => {
                if let Some(summary) = parcels.get_mut(&parcel_id) {
                    summary.status = ParcelStatus::Transfer;
                    summary.current_warehouse = None;
                    summary.updated_at = data.started_at;
                }
            }
            ParcelEvent::ParcelTransferCompleted(data) => {
                if let Some(summary) = parcels.get_mut(&parcel_id) {
                    summary.status = ParcelStatus::InWarehouse;
                    summary.current_warehouse = Some(data.warehouse_id);
                    summary.updated_at = data.completed_at;
                }
            }
            ParcelEvent::ParcelDeliveryStarted(data) => {
                if let Some(summary) = parcels.get_mut(&parcel_id) {
                    summary.status = ParcelStatus::TransitToCustomer;
                    summary.current_vehicle = Some(data.vehicle_id);
                    summary.current_warehouse = None;
                    summary.updated_at = data.started_at;
                }
            }
            ParcelEvent::ParcelDelivered(_) => {
                // Terminal: the parcel leaves the "underway" view.
                parcels.remove(&parcel_id);
            }
        }

        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        self.parcels.write().await.clear();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}
