//! Parcel journey read model - the full ordered timeline per parcel.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::AggregateId;
use domain::{ParcelEvent, VehicleId, WarehouseId};
use event_store::EventEnvelope;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// One entry in a parcel's journey timeline.
#[derive(Debug, Clone)]
pub struct JourneyEntry {
    pub event_type: String,
    pub at: DateTime<Utc>,
    pub warehouse_id: Option<WarehouseId>,
    pub vehicle_id: Option<VehicleId>,
}

/// Read model view of each parcel's full journey, delivered or not.
#[derive(Clone)]
pub struct ParcelJourneyView {
    journeys: Arc<RwLock<HashMap<AggregateId, Vec<JourneyEntry>>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl ParcelJourneyView {
    /// Creates a new empty view.
    pub fn new() -> Self {
        Self {
            journeys: Arc::new(RwLock::new(HashMap::new())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    /// The parcel's timeline in event order.
    pub async fn journey(&self, parcel_id: AggregateId) -> Vec<JourneyEntry> {
        self.journeys
            .read()
            .await
            .get(&parcel_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of parcels with at least one entry.
    pub async fn len(&self) -> usize {
        self.journeys.read().await.len()
    }

    /// Returns true if no journey has been recorded.
    pub async fn is_empty(&self) -> bool {
        self.journeys.read().await.is_empty()
    }
}

impl Default for ParcelJourneyView {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadModel for ParcelJourneyView {
    fn name(&self) -> &'static str {
        "ParcelJourneyView"
    }
}

#[async_trait]
impl Projection for ParcelJourneyView {
    fn name(&self) -> &'static str {
        "ParcelJourneyView"
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

        let (at, warehouse_id, vehicle_id) = match &parcel_event {
            ParcelEvent::ParcelRegistered(data) => (data.registered_at, None, None),
            ParcelEvent::ParcelPickedUp(data) => {
                (data.picked_up_at, None, Some(data.vehicle_id.clone()))
            }
            ParcelEvent::ParcelArrivedAtWarehouse(data) => {
                (data.arrived_at, Some(data.warehouse_id.clone()), None)
            }
            ParcelEvent::ParcelTransferStarted(data) => (
                data.started_at,
                Some(data.destination_warehouse_id.clone()),
                None,
            ),
            ParcelEvent::ParcelTransferCompleted(data) => {
                (data.completed_at, Some(data.warehouse_id.clone()), None)
            }
            ParcelEvent::ParcelDeliveryStarted(data) => {
                (data.started_at, None, Some(data.vehicle_id.clone()))
            }
            ParcelEvent::ParcelDelivered(data) => {
                (data.delivered_at, None, Some(data.vehicle_id.clone()))
            }
        };

        self.journeys
            .write()
            .await
            .entry(event.aggregate_id)
            .or_default()
            .push(JourneyEntry {
                event_type: event.event_type.clone(),
                at,
                warehouse_id,
                vehicle_id,
            });

        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        self.journeys.write().await.clear();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}
