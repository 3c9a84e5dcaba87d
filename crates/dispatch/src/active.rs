//! The progress generator's tracking set.

use std::collections::HashSet;
use std::sync::Arc;

use domain::{JobId, VehicleId};
use tokio::sync::RwLock;

/// Shared registry of work the progress generator still has to sweep:
/// vehicles with at least one open job, and open transfer jobs.
///
/// The orchestrator adds entries when it creates work; the generator
/// removes them once a vehicle goes idle or a transfer completes.
#[derive(Clone, Default)]
pub struct ActiveSet {
    vehicles: Arc<RwLock<HashSet<VehicleId>>>,
    transfers: Arc<RwLock<HashSet<JobId>>>,
}

impl ActiveSet {
    /// Creates an empty tracking set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a vehicle as having open work.
    pub async fn add_vehicle(&self, vehicle_id: VehicleId) {
        self.vehicles.write().await.insert(vehicle_id);
    }

    /// Drops an idle vehicle from the sweep.
    pub async fn remove_vehicle(&self, vehicle_id: &VehicleId) {
        self.vehicles.write().await.remove(vehicle_id);
    }

    /// The vehicles to sweep, in stable order.
    pub async fn vehicles(&self) -> Vec<VehicleId> {
        let mut ids: Vec<_> = self.vehicles.read().await.iter().cloned().collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids
    }

    /// Marks a transfer job as open.
    pub async fn add_transfer(&self, job_id: JobId) {
        self.transfers.write().await.insert(job_id);
    }

    /// Drops a finished transfer job from the sweep.
    pub async fn remove_transfer(&self, job_id: &JobId) {
        self.transfers.write().await.remove(job_id);
    }

    /// The transfer jobs to sweep, in stable order.
    pub async fn transfers(&self) -> Vec<JobId> {
        let mut ids: Vec<_> = self.transfers.read().await.iter().cloned().collect();
        ids.sort_by_key(|id| id.as_uuid());
        ids
    }
}
