//! In-memory fleet store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use common::AggregateId;
use domain::{JobId, VehicleId, WarehouseId};
use tokio::sync::RwLock;

use crate::error::{FleetError, Result};
use crate::records::{Job, Order, RouteKind, TransferJob, Vehicle, Warehouse, WarehouseStatus};
use crate::store::{FleetStore, JobBatch};

#[derive(Debug, Default)]
struct FleetState {
    warehouses: HashMap<WarehouseId, Warehouse>,
    vehicles: HashMap<VehicleId, Vehicle>,
    orders: HashMap<(AggregateId, RouteKind), Order>,
    jobs: HashMap<JobId, Job>,
    transfer_jobs: HashMap<JobId, TransferJob>,
}

/// In-memory fleet store.
///
/// All state sits behind a single lock, which is what makes
/// `commit_job_batch` atomic: the batch is validated and applied while no
/// other writer can observe intermediate state.
#[derive(Clone, Default)]
pub struct InMemoryFleetStore {
    state: Arc<RwLock<FleetState>>,
}

impl InMemoryFleetStore {
    /// Creates a new empty fleet store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of pending orders across all warehouses.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Returns the number of stored jobs.
    pub async fn job_count(&self) -> usize {
        self.state.read().await.jobs.len()
    }

    /// Returns the number of stored transfer jobs.
    pub async fn transfer_job_count(&self) -> usize {
        self.state.read().await.transfer_jobs.len()
    }
}

#[async_trait]
impl FleetStore for InMemoryFleetStore {
    async fn put_warehouse(&self, warehouse: Warehouse) -> Result<()> {
        let mut state = self.state.write().await;
        state.warehouses.insert(warehouse.id.clone(), warehouse);
        Ok(())
    }

    async fn get_warehouse(&self, id: &WarehouseId) -> Result<Option<Warehouse>> {
        Ok(self.state.read().await.warehouses.get(id).cloned())
    }

    async fn available_warehouses(&self) -> Result<Vec<Warehouse>> {
        let state = self.state.read().await;
        let mut warehouses: Vec<_> = state
            .warehouses
            .values()
            .filter(|w| w.status == WarehouseStatus::Available)
            .cloned()
            .collect();
        warehouses.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        Ok(warehouses)
    }

    async fn put_vehicle(&self, vehicle: Vehicle) -> Result<()> {
        let mut state = self.state.write().await;
        state.vehicles.insert(vehicle.id.clone(), vehicle);
        Ok(())
    }

    async fn get_vehicle(&self, id: &VehicleId) -> Result<Option<Vehicle>> {
        Ok(self.state.read().await.vehicles.get(id).cloned())
    }

    async fn available_vehicles(
        &self,
        warehouse_id: &WarehouseId,
        kind: RouteKind,
        min_capacity_secs: i64,
        limit: usize,
    ) -> Result<Vec<Vehicle>> {
        let state = self.state.read().await;
        let mut vehicles: Vec<_> = state
            .vehicles
            .values()
            .filter(|v| {
                v.warehouse_id == *warehouse_id
                    && v.kind == kind
                    && v.capacity_secs >= min_capacity_secs
            })
            .cloned()
            .collect();
        vehicles.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        vehicles.truncate(limit);
        Ok(vehicles)
    }

    async fn reset_vehicle_capacities(&self, capacity_secs: i64) -> Result<()> {
        let mut state = self.state.write().await;
        for vehicle in state.vehicles.values_mut() {
            vehicle.capacity_secs = capacity_secs;
        }
        Ok(())
    }

    async fn put_order(&self, order: Order) -> Result<()> {
        let mut state = self.state.write().await;
        state.orders.insert(order.key(), order);
        Ok(())
    }

    async fn pending_orders(
        &self,
        warehouse_id: &WarehouseId,
        date: NaiveDate,
        kind: RouteKind,
        limit: usize,
    ) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<_> = state
            .orders
            .values()
            .filter(|o| o.warehouse_id == *warehouse_id && o.date == date && o.kind == kind)
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.parcel_id.as_uuid());
        orders.truncate(limit);
        Ok(orders)
    }

    async fn get_job(&self, id: JobId) -> Result<Option<Job>> {
        Ok(self.state.read().await.jobs.get(&id).cloned())
    }

    async fn put_job(&self, job: Job) -> Result<()> {
        let mut state = self.state.write().await;
        state.jobs.insert(job.id, job);
        Ok(())
    }

    async fn jobs_for_vehicle(&self, vehicle_id: &VehicleId) -> Result<Vec<Job>> {
        let state = self.state.read().await;
        let mut jobs: Vec<_> = state
            .jobs
            .values()
            .filter(|j| j.vehicle_id == *vehicle_id)
            .cloned()
            .collect();
        jobs.sort_by_key(|j| (j.date, j.id.as_uuid()));
        Ok(jobs)
    }

    async fn get_transfer_job(&self, id: JobId) -> Result<Option<TransferJob>> {
        Ok(self.state.read().await.transfer_jobs.get(&id).cloned())
    }

    async fn put_transfer_job(&self, job: TransferJob) -> Result<()> {
        let mut state = self.state.write().await;
        state.transfer_jobs.insert(job.id, job);
        Ok(())
    }

    async fn find_pending_transfer(
        &self,
        connection: &str,
        date: NaiveDate,
    ) -> Result<Option<TransferJob>> {
        let state = self.state.read().await;
        Ok(state
            .transfer_jobs
            .values()
            .find(|t| {
                t.connection == connection
                    && t.date == date
                    && t.status == crate::records::JobStatus::Pending
            })
            .cloned())
    }

    async fn commit_job_batch(&self, batch: JobBatch) -> Result<()> {
        let mut state = self.state.write().await;

        // Validate the whole batch before touching anything.
        for (vehicle_id, _) in &batch.capacity_decrements {
            if !state.vehicles.contains_key(vehicle_id) {
                return Err(FleetError::VehicleNotFound(vehicle_id.clone()));
            }
        }

        for (vehicle_id, decrement) in &batch.capacity_decrements {
            if let Some(vehicle) = state.vehicles.get_mut(vehicle_id) {
                vehicle.capacity_secs -= decrement;
            }
        }
        for job in batch.jobs {
            state.jobs.insert(job.id, job);
        }
        for key in &batch.consumed_orders {
            state.orders.remove(key);
        }

        Ok(())
    }
}
