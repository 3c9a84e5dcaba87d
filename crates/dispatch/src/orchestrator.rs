//! Job orchestration: batch creation, transfer consolidation and arrival
//! routing.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use common::AggregateId;
use domain::{JobId, ParcelService, WarehouseId};
use event_store::EventStore;
use fleet::{
    FleetError, FleetStore, Job, JobBatch, JobStatus, Order, RouteKind, TransferJob,
};

use crate::active::ActiveSet;
use crate::bus::{DispatchNotice, NoticeBus};
use crate::error::{DispatchError, Result};
use crate::optimizer::RouteOptimizer;

/// Orders are paged in bounded chunks until the backlog is drained.
const ORDER_PAGE_SIZE: usize = 50;

/// At most this many vehicles are offered to the optimizer per page.
const MAX_VEHICLES_PER_BATCH: usize = 10;

/// Vehicles below this remaining capacity are not offered at all.
const VEHICLE_CAPACITY_FLOOR_SECS: i64 = 1800;

/// Transfers leave at 20:00 local; a parcel arriving later rides the next
/// night's connection.
const NIGHT_CUTOFF_HOUR: u32 = 20;

/// The calendar night a transfer enrolled right now would ride: today
/// before the evening cutoff, tomorrow after it.
pub fn next_night(now: DateTime<Utc>) -> NaiveDate {
    if now.hour() < NIGHT_CUTOFF_HOUR {
        now.date_naive()
    } else {
        now.date_naive().succ_opt().unwrap_or_else(|| now.date_naive())
    }
}

/// Turns pending orders into vehicle jobs and cross-warehouse parcels into
/// nightly transfer jobs.
pub struct JobOrchestrator<S, F, O, N>
where
    S: EventStore,
    F: FleetStore,
    O: RouteOptimizer,
    N: NoticeBus,
{
    store: F,
    optimizer: O,
    bus: N,
    parcels: Arc<ParcelService<S>>,
    active: ActiveSet,
}

impl<S, F, O, N> JobOrchestrator<S, F, O, N>
where
    S: EventStore + Send + Sync,
    F: FleetStore,
    O: RouteOptimizer,
    N: NoticeBus,
{
    /// Creates a new orchestrator over explicit collaborator handles.
    pub fn new(
        store: F,
        optimizer: O,
        bus: N,
        parcels: Arc<ParcelService<S>>,
        active: ActiveSet,
    ) -> Self {
        Self {
            store,
            optimizer,
            bus,
            parcels,
            active,
        }
    }

    /// The tracking set shared with the progress generator.
    pub fn active(&self) -> &ActiveSet {
        &self.active
    }

    /// Batches pending pickup orders for a warehouse and date into jobs.
    #[tracing::instrument(skip(self))]
    pub async fn create_pickup_jobs(
        &self,
        warehouse_id: &WarehouseId,
        date: NaiveDate,
    ) -> Result<Vec<JobId>> {
        self.create_jobs(RouteKind::Pickup, warehouse_id, date).await
    }

    /// Batches pending delivery orders for a warehouse and date into jobs.
    #[tracing::instrument(skip(self))]
    pub async fn create_delivery_jobs(
        &self,
        warehouse_id: &WarehouseId,
        date: NaiveDate,
    ) -> Result<Vec<JobId>> {
        self.create_jobs(RouteKind::Delivery, warehouse_id, date)
            .await
    }

    /// The shared batching loop, parameterized by direction.
    ///
    /// Pages through pending orders until none remain. Each page is
    /// submitted to the optimizer together with the available vehicles,
    /// and the resulting jobs land in one atomic write with the capacity
    /// decrements and order deletions. NOT idempotent across retries: a
    /// re-run after a partial external failure can double-book vehicles.
    async fn create_jobs(
        &self,
        kind: RouteKind,
        warehouse_id: &WarehouseId,
        date: NaiveDate,
    ) -> Result<Vec<JobId>> {
        let warehouse = self
            .store
            .get_warehouse(warehouse_id)
            .await?
            .ok_or_else(|| FleetError::WarehouseNotFound(warehouse_id.clone()))?;

        let mut created = Vec::new();

        loop {
            let orders = self
                .store
                .pending_orders(warehouse_id, date, kind, ORDER_PAGE_SIZE)
                .await?;
            if orders.is_empty() {
                break;
            }

            let vehicles = self
                .store
                .available_vehicles(
                    warehouse_id,
                    kind,
                    VEHICLE_CAPACITY_FLOOR_SECS,
                    MAX_VEHICLES_PER_BATCH,
                )
                .await?;
            if vehicles.is_empty() {
                return Err(DispatchError::NoVehiclesAvailable {
                    warehouse_id: warehouse_id.clone(),
                    kind,
                });
            }

            let routes = self
                .optimizer
                .optimize(&vehicles, &warehouse, &orders)
                .await?;

            let mut batch = JobBatch::default();
            let mut announcements = Vec::new();
            for route in routes {
                if route.steps.is_empty() {
                    continue;
                }

                let mut steps = route.steps;
                steps.sort_by_key(|s| s.arrival_offset_secs);

                let job = Job {
                    id: JobId::new(),
                    kind,
                    status: JobStatus::Pending,
                    date,
                    warehouse_id: warehouse.id.clone(),
                    vehicle_id: route.vehicle_id.clone(),
                    duration_secs: route.duration_secs,
                    steps,
                };
                batch
                    .capacity_decrements
                    .push((route.vehicle_id.clone(), route.duration_secs));
                announcements.push((job.id, route.vehicle_id));
                batch.jobs.push(job);
            }

            let planned: HashSet<AggregateId> = batch
                .jobs
                .iter()
                .flat_map(|j| j.steps.iter().map(|s| s.parcel_id))
                .collect();
            if planned.is_empty() {
                return Err(DispatchError::Optimizer(
                    "solver returned no assignments for a non-empty page".to_string(),
                ));
            }
            batch.consumed_orders = orders
                .iter()
                .filter(|o| planned.contains(&o.parcel_id))
                .map(Order::key)
                .collect();

            self.store.commit_job_batch(batch).await?;
            metrics::counter!("jobs_created_total").increment(announcements.len() as u64);

            for (job_id, vehicle_id) in announcements {
                self.bus
                    .publish(DispatchNotice::JobCreated {
                        job_id,
                        warehouse_id: warehouse.id.clone(),
                        vehicle_id: vehicle_id.clone(),
                        kind,
                        date,
                    })
                    .await;
                self.active.add_vehicle(vehicle_id).await;
                created.push(job_id);
            }
        }

        tracing::info!(
            warehouse = %warehouse.id,
            %kind,
            jobs = created.len(),
            "job batching finished"
        );

        Ok(created)
    }

    /// Enrolls a parcel on the nightly transfer for a connection.
    ///
    /// All parcels heading the same way on the same night share one
    /// transfer job: an existing pending job for the connection+date is
    /// appended to, otherwise a new one is opened and handed to the
    /// progress generator's tracking set.
    #[tracing::instrument(skip(self))]
    pub async fn enroll_transfer(
        &self,
        parcel_id: AggregateId,
        source: &WarehouseId,
        destination: &WarehouseId,
        now: DateTime<Utc>,
    ) -> Result<JobId> {
        let connection = TransferJob::connection_key(source, destination);
        let date = next_night(now);

        if let Some(mut job) = self.store.find_pending_transfer(&connection, date).await? {
            job.parcel_ids.push(parcel_id);
            let job_id = job.id;
            self.store.put_transfer_job(job).await?;
            tracing::debug!(%parcel_id, %connection, %date, "joined existing transfer job");
            return Ok(job_id);
        }

        let job = TransferJob {
            id: JobId::new(),
            status: JobStatus::Pending,
            date,
            source_warehouse_id: source.clone(),
            destination_warehouse_id: destination.clone(),
            connection: connection.clone(),
            parcel_ids: vec![parcel_id],
        };
        let job_id = job.id;
        self.store.put_transfer_job(job).await?;
        metrics::counter!("transfer_jobs_created_total").increment(1);

        self.bus
            .publish(DispatchNotice::TransferJobCreated {
                job_id,
                connection,
                date,
            })
            .await;
        self.active.add_transfer(job_id).await;

        Ok(job_id)
    }

    /// Routes a parcel that just arrived at a warehouse.
    ///
    /// Arrival at the plan's last warehouse schedules the delivery leg;
    /// any other arrival queues the parcel for the transfer toward its
    /// next hop.
    pub async fn route_arrival(
        &self,
        parcel_id: AggregateId,
        warehouse_id: &WarehouseId,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let parcel = self
            .parcels
            .get_parcel(parcel_id)
            .await?
            .ok_or(DispatchError::ParcelNotRoutable(parcel_id))?;
        let plan = parcel
            .transit_warehouses()
            .ok_or(DispatchError::ParcelNotRoutable(parcel_id))?;

        if plan.is_final(warehouse_id) {
            let warehouse = self
                .store
                .get_warehouse(warehouse_id)
                .await?
                .ok_or_else(|| FleetError::WarehouseNotFound(warehouse_id.clone()))?;
            let location = parcel
                .delivery_location()
                .ok_or(DispatchError::ParcelNotRoutable(parcel_id))?;
            let date = parcel
                .delivery_date()
                .ok_or(DispatchError::ParcelNotRoutable(parcel_id))?;

            self.store
                .put_order(Order {
                    parcel_id,
                    kind: RouteKind::Delivery,
                    warehouse_id: warehouse.id.clone(),
                    date,
                    location,
                    warehouse,
                })
                .await?;
            tracing::debug!(%parcel_id, warehouse = %warehouse_id, "delivery order created");
        } else {
            let next = plan
                .next_after(warehouse_id)
                .ok_or(DispatchError::ParcelNotRoutable(parcel_id))?;
            self.enroll_transfer(parcel_id, warehouse_id, next, now)
                .await?;
        }

        Ok(())
    }

    /// Resets every vehicle to the full daily capacity (the "new day"
    /// trigger).
    #[tracing::instrument(skip(self))]
    pub async fn reset_vehicles(&self, capacity_secs: i64) -> Result<()> {
        self.store.reset_vehicle_capacities(capacity_secs).await?;
        Ok(())
    }
}
