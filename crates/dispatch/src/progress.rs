//! Progress generator: the periodic sweep that advances vehicles and
//! transfers as wall-clock time passes.
//!
//! Each sweep walks the tracking set. For a transit job the elapsed time
//! since the job started decides at most one action per vehicle: complete
//! the next crossed step, finish the job, or (delivery only) publish an
//! interpolated position. Transfer jobs follow the day/night schedule
//! instead: out at 20:00, back between 04:00 and 06:00.
//!
//! The per-step `done` flags live only in this process. A crash between
//! emitting a step's event and marking it done re-emits on the next sweep:
//! at-least-once, by design.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Timelike, Utc};
use common::Location;
use domain::{
    CompleteTransfer, JobId, ParcelService, RecordDelivery, RecordPickup, RecordWarehouseArrival,
    StartDelivery, StartTransfer, VehicleId,
};
use event_store::EventStore;
use fleet::{FleetError, FleetStore, Job, JobStatus, RouteKind, TransferJob};
use tokio::sync::RwLock;

use crate::active::ActiveSet;
use crate::bus::{DispatchNotice, NoticeBus};
use crate::error::{DispatchError, Result};
use crate::optimizer::RouteOptimizer;
use crate::orchestrator::JobOrchestrator;

/// Hour (inclusive) from which a pending transfer departs.
const TRANSFER_DEPARTURE_HOUR: u32 = 20;

/// Earliest hour a running transfer may arrive.
const TRANSFER_ARRIVAL_WINDOW_START: u32 = 4;

/// Last hour of the arrival window.
const TRANSFER_ARRIVAL_WINDOW_END: u32 = 6;

/// Chance of arriving already in the window's first hour.
const EARLY_ARRIVAL_CHANCE: f64 = 0.3;

/// A vehicle's last published position.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedPosition {
    pub location: Location,
    pub at: DateTime<Utc>,
}

/// Read model of vehicle positions fed by the sweep.
///
/// Pure position updates never become domain events; this map is the only
/// place they surface.
#[derive(Clone, Default)]
pub struct VehicleTracker {
    positions: Arc<RwLock<HashMap<VehicleId, TrackedPosition>>>,
}

impl VehicleTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a vehicle's position.
    pub async fn publish(&self, vehicle_id: &VehicleId, location: Location, at: DateTime<Utc>) {
        self.positions
            .write()
            .await
            .insert(vehicle_id.clone(), TrackedPosition { location, at });
    }

    /// The vehicle's last published position, if any.
    pub async fn position(&self, vehicle_id: &VehicleId) -> Option<TrackedPosition> {
        self.positions.read().await.get(vehicle_id).cloned()
    }
}

/// What one sweep did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Vehicles visited.
    pub vehicles_swept: usize,
    /// Transfer jobs visited.
    pub transfers_swept: usize,
    /// Lifecycle events emitted.
    pub events_emitted: usize,
}

/// Ephemeral per-job cursor: when the job started and which steps are done.
#[derive(Debug, Clone)]
struct JobCursor {
    started: DateTime<Utc>,
    done: Vec<bool>,
}

/// The time-driven sweep over active vehicles and transfers.
pub struct ProgressGenerator<S, F, O, N>
where
    S: EventStore,
    F: FleetStore,
    O: RouteOptimizer,
    N: NoticeBus,
{
    store: F,
    parcels: Arc<ParcelService<S>>,
    orchestrator: Arc<JobOrchestrator<S, F, O, N>>,
    bus: N,
    active: ActiveSet,
    tracker: VehicleTracker,
    cursors: Arc<RwLock<HashMap<JobId, JobCursor>>>,
    roll: Arc<dyn Fn() -> f64 + Send + Sync>,
}

impl<S, F, O, N> ProgressGenerator<S, F, O, N>
where
    S: EventStore + Send + Sync,
    F: FleetStore,
    O: RouteOptimizer,
    N: NoticeBus,
{
    /// Creates a generator with the default random roll.
    pub fn new(
        store: F,
        parcels: Arc<ParcelService<S>>,
        orchestrator: Arc<JobOrchestrator<S, F, O, N>>,
        bus: N,
        active: ActiveSet,
        tracker: VehicleTracker,
    ) -> Self {
        Self {
            store,
            parcels,
            orchestrator,
            bus,
            active,
            tracker,
            cursors: Arc::default(),
            roll: Arc::new(rand::random::<f64>),
        }
    }

    /// Replaces the arrival roll; tests pin it to force or forbid the
    /// early-hour completion.
    pub fn with_roll(mut self, roll: impl Fn() -> f64 + Send + Sync + 'static) -> Self {
        self.roll = Arc::new(roll);
        self
    }

    /// The tracker this generator publishes positions into.
    pub fn tracker(&self) -> &VehicleTracker {
        &self.tracker
    }

    /// Runs one sweep at the given time.
    #[tracing::instrument(skip(self))]
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let mut report = SweepReport::default();

        for vehicle_id in self.active.vehicles().await {
            report.vehicles_swept += 1;
            report.events_emitted += self.advance_vehicle(&vehicle_id, now).await?;
        }

        for job_id in self.active.transfers().await {
            report.transfers_swept += 1;
            report.events_emitted += self.advance_transfer(job_id, now).await?;
        }

        metrics::counter!("sweep_events_emitted_total").increment(report.events_emitted as u64);
        Ok(report)
    }

    /// Advances one vehicle by at most one action.
    async fn advance_vehicle(&self, vehicle_id: &VehicleId, now: DateTime<Utc>) -> Result<usize> {
        let jobs = self.store.jobs_for_vehicle(vehicle_id).await?;

        let mut in_progress: Vec<&Job> = jobs
            .iter()
            .filter(|j| j.status == JobStatus::InProgress)
            .collect();
        if in_progress.len() > 1 {
            return Err(DispatchError::MultipleActiveJobs(vehicle_id.clone()));
        }

        let job = match in_progress.pop() {
            Some(job) => job.clone(),
            None => {
                let pending = jobs.iter().find(|j| j.status == JobStatus::Pending);
                match pending {
                    Some(job) => return self.start_job(job.clone(), now).await,
                    None => {
                        // Idle vehicle: nothing pending, nothing running.
                        self.active.remove_vehicle(vehicle_id).await;
                        return Ok(0);
                    }
                }
            }
        };

        // A missing cursor (e.g. after a process restart) restarts the
        // clock from this sweep; completed steps would be re-emitted,
        // which is the documented at-least-once behavior.
        let cursor = {
            let mut cursors = self.cursors.write().await;
            cursors
                .entry(job.id)
                .or_insert_with(|| JobCursor {
                    started: now,
                    done: vec![false; job.steps.len()],
                })
                .clone()
        };

        let elapsed = (now - cursor.started).num_seconds();
        let next_undone = cursor.done.iter().position(|d| !d);

        match next_undone {
            Some(idx) if elapsed >= job.steps[idx].arrival_offset_secs => {
                self.complete_step(&job, idx, now).await
            }
            None if elapsed > job.duration_secs => self.complete_job(&job, now).await,
            Some(idx) if job.kind == RouteKind::Delivery => {
                self.publish_interpolated_position(&job, idx, elapsed, now)
                    .await?;
                Ok(0)
            }
            _ => Ok(0),
        }
    }

    /// Promotes a pending job to in-progress.
    ///
    /// Delivery jobs announce the outgoing leg for every parcel on board
    /// as soon as the vehicle leaves.
    async fn start_job(&self, mut job: Job, now: DateTime<Utc>) -> Result<usize> {
        job.status = JobStatus::InProgress;
        self.store.put_job(job.clone()).await?;
        self.cursors.write().await.insert(
            job.id,
            JobCursor {
                started: now,
                done: vec![false; job.steps.len()],
            },
        );
        tracing::debug!(job = %job.id, vehicle = %job.vehicle_id, kind = %job.kind, "job started");

        let mut emitted = 0;
        if job.kind == RouteKind::Delivery {
            for step in &job.steps {
                self.parcels
                    .start_delivery(StartDelivery::new(
                        step.parcel_id,
                        job.vehicle_id.clone(),
                        now,
                    ))
                    .await?;
                self.bus
                    .publish(DispatchNotice::ParcelLifecycle {
                        parcel_id: step.parcel_id,
                        event_type: "ParcelDeliveryStarted",
                    })
                    .await;
                emitted += 1;
            }
        }

        Ok(emitted)
    }

    /// Emits the step's lifecycle event and pins the vehicle to the stop.
    async fn complete_step(&self, job: &Job, idx: usize, now: DateTime<Utc>) -> Result<usize> {
        let step = &job.steps[idx];

        match job.kind {
            RouteKind::Pickup => {
                self.parcels
                    .record_pickup(RecordPickup::new(
                        step.parcel_id,
                        job.vehicle_id.clone(),
                        now,
                    ))
                    .await?;
                self.bus
                    .publish(DispatchNotice::ParcelLifecycle {
                        parcel_id: step.parcel_id,
                        event_type: "ParcelPickedUp",
                    })
                    .await;
            }
            RouteKind::Delivery => {
                self.parcels
                    .record_delivery(RecordDelivery::new(
                        step.parcel_id,
                        job.vehicle_id.clone(),
                        now,
                    ))
                    .await?;
                self.bus
                    .publish(DispatchNotice::ParcelLifecycle {
                        parcel_id: step.parcel_id,
                        event_type: "ParcelDelivered",
                    })
                    .await;
            }
        }

        if let Some(cursor) = self.cursors.write().await.get_mut(&job.id) {
            cursor.done[idx] = true;
        }
        self.tracker
            .publish(&job.vehicle_id, step.location, now)
            .await;

        Ok(1)
    }

    /// Closes a job whose steps are all done and whose duration has
    /// elapsed; the vehicle is back at its warehouse.
    async fn complete_job(&self, job: &Job, now: DateTime<Utc>) -> Result<usize> {
        let mut finished = job.clone();
        finished.status = JobStatus::Completed;
        self.store.put_job(finished).await?;
        self.cursors.write().await.remove(&job.id);

        let warehouse = self
            .store
            .get_warehouse(&job.warehouse_id)
            .await?
            .ok_or_else(|| FleetError::WarehouseNotFound(job.warehouse_id.clone()))?;
        self.tracker
            .publish(&job.vehicle_id, warehouse.location, now)
            .await;
        tracing::debug!(job = %job.id, vehicle = %job.vehicle_id, "job completed");

        let mut emitted = 0;
        if job.kind == RouteKind::Pickup {
            // Everything the vehicle collected arrives at the warehouse
            // together, and each arrival decides the parcel's next hop.
            for step in &job.steps {
                self.parcels
                    .record_warehouse_arrival(RecordWarehouseArrival::new(
                        step.parcel_id,
                        job.warehouse_id.clone(),
                        now,
                    ))
                    .await?;
                self.bus
                    .publish(DispatchNotice::ParcelLifecycle {
                        parcel_id: step.parcel_id,
                        event_type: "ParcelArrivedAtWarehouse",
                    })
                    .await;
                emitted += 1;

                self.orchestrator
                    .route_arrival(step.parcel_id, &job.warehouse_id, now)
                    .await?;
            }
        }

        Ok(emitted)
    }

    /// Publishes the vehicle's position between two stops, proportional to
    /// the time spent on the current leg.
    async fn publish_interpolated_position(
        &self,
        job: &Job,
        next_idx: usize,
        elapsed: i64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let (from_location, from_offset) = if next_idx == 0 {
            let warehouse = self
                .store
                .get_warehouse(&job.warehouse_id)
                .await?
                .ok_or_else(|| FleetError::WarehouseNotFound(job.warehouse_id.clone()))?;
            (warehouse.location, 0)
        } else {
            let prev = &job.steps[next_idx - 1];
            (prev.location, prev.arrival_offset_secs)
        };

        let next = &job.steps[next_idx];
        let leg = next.arrival_offset_secs - from_offset;
        let ratio = if leg <= 0 {
            1.0
        } else {
            (elapsed - from_offset) as f64 / leg as f64
        };

        let position = from_location.interpolate(&next.location, ratio);
        self.tracker.publish(&job.vehicle_id, position, now).await;
        Ok(())
    }

    /// Advances one transfer job along the day/night schedule.
    async fn advance_transfer(&self, job_id: JobId, now: DateTime<Utc>) -> Result<usize> {
        let Some(job) = self.store.get_transfer_job(job_id).await? else {
            self.active.remove_transfer(&job_id).await;
            return Ok(0);
        };

        match job.status {
            JobStatus::Pending if now.hour() >= TRANSFER_DEPARTURE_HOUR => {
                self.start_transfer_job(job, now).await
            }
            JobStatus::InProgress if self.transfer_arrives(now.hour()) => {
                self.complete_transfer_job(job, now).await
            }
            JobStatus::Completed => {
                self.active.remove_transfer(&job_id).await;
                Ok(0)
            }
            _ => Ok(0),
        }
    }

    /// Whether a running transfer arrives at this hour: always from 05:00,
    /// by chance at 04:00, never outside the window.
    fn transfer_arrives(&self, hour: u32) -> bool {
        if !(TRANSFER_ARRIVAL_WINDOW_START..=TRANSFER_ARRIVAL_WINDOW_END).contains(&hour) {
            return false;
        }
        hour > TRANSFER_ARRIVAL_WINDOW_START || (self.roll)() < EARLY_ARRIVAL_CHANCE
    }

    async fn start_transfer_job(&self, mut job: TransferJob, now: DateTime<Utc>) -> Result<usize> {
        job.status = JobStatus::InProgress;
        self.store.put_transfer_job(job.clone()).await?;
        tracing::debug!(job = %job.id, connection = %job.connection, "transfer departed");

        let mut emitted = 0;
        for parcel_id in &job.parcel_ids {
            self.parcels
                .start_transfer(StartTransfer::new(
                    *parcel_id,
                    job.id,
                    job.destination_warehouse_id.clone(),
                    now,
                ))
                .await?;
            self.bus
                .publish(DispatchNotice::ParcelLifecycle {
                    parcel_id: *parcel_id,
                    event_type: "ParcelTransferStarted",
                })
                .await;
            emitted += 1;
        }

        Ok(emitted)
    }

    async fn complete_transfer_job(
        &self,
        mut job: TransferJob,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        job.status = JobStatus::Completed;
        self.store.put_transfer_job(job.clone()).await?;
        self.active.remove_transfer(&job.id).await;
        tracing::debug!(job = %job.id, connection = %job.connection, "transfer arrived");

        let mut emitted = 0;
        for parcel_id in &job.parcel_ids {
            self.parcels
                .complete_transfer(CompleteTransfer::new(
                    *parcel_id,
                    job.destination_warehouse_id.clone(),
                    now,
                ))
                .await?;
            self.bus
                .publish(DispatchNotice::ParcelLifecycle {
                    parcel_id: *parcel_id,
                    event_type: "ParcelTransferCompleted",
                })
                .await;
            emitted += 1;

            self.orchestrator
                .route_arrival(*parcel_id, &job.destination_warehouse_id, now)
                .await?;
        }

        Ok(emitted)
    }
}
