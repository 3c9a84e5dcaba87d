//! Route optimizer trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::VehicleId;
use fleet::{JobStep, Order, Vehicle, Warehouse};

use crate::error::DispatchError;

/// One vehicle's planned route as the optimizer returns it.
#[derive(Debug, Clone)]
pub struct PlannedRoute {
    /// The vehicle the route is assigned to.
    pub vehicle_id: VehicleId,

    /// Total route duration in seconds, including the return leg.
    pub duration_secs: i64,

    /// Stops in driving order, ascending arrival offsets.
    pub steps: Vec<JobStep>,
}

/// Trait for the external route optimization solver.
///
/// The solver distributes the orders over the offered vehicles and
/// sequences each route, respecting the vehicles' remaining capacity. Its
/// internals are opaque; a transport or timeout failure is fatal for the
/// current batch.
#[async_trait]
pub trait RouteOptimizer: Send + Sync {
    /// Plans one route per used vehicle for the given orders.
    async fn optimize(
        &self,
        vehicles: &[Vehicle],
        warehouse: &Warehouse,
        orders: &[Order],
    ) -> Result<Vec<PlannedRoute>, DispatchError>;
}

/// Travel speed the in-memory solver assumes, in km/h.
const TRAVEL_SPEED_KMH: f64 = 50.0;

/// Fixed handling time per stop, in seconds.
const STOP_SERVICE_SECS: i64 = 120;

#[derive(Debug, Default)]
struct InMemoryOptimizerState {
    fail_on_optimize: bool,
    call_count: usize,
}

/// In-memory optimizer for testing: round-robins orders over the vehicles
/// and sequences each route nearest-neighbour from the warehouse.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRouteOptimizer {
    state: Arc<RwLock<InMemoryOptimizerState>>,
}

impl InMemoryRouteOptimizer {
    /// Creates a new in-memory optimizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the optimizer to fail the next call (simulating a
    /// transport/timeout failure).
    pub fn set_fail_on_optimize(&self, fail: bool) {
        self.state.write().unwrap().fail_on_optimize = fail;
    }

    /// Returns how many times optimize was called.
    pub fn call_count(&self) -> usize {
        self.state.read().unwrap().call_count
    }
}

#[async_trait]
impl RouteOptimizer for InMemoryRouteOptimizer {
    async fn optimize(
        &self,
        vehicles: &[Vehicle],
        warehouse: &Warehouse,
        orders: &[Order],
    ) -> Result<Vec<PlannedRoute>, DispatchError> {
        {
            let mut state = self.state.write().unwrap();
            state.call_count += 1;
            if state.fail_on_optimize {
                return Err(DispatchError::Optimizer("solver timed out".to_string()));
            }
        }

        if vehicles.is_empty() {
            return Ok(vec![]);
        }

        // Distribute orders round-robin over the vehicles.
        let mut assignments: Vec<Vec<&Order>> = vec![Vec::new(); vehicles.len()];
        for (i, order) in orders.iter().enumerate() {
            assignments[i % vehicles.len()].push(order);
        }

        let mut routes = Vec::new();
        for (vehicle, mut assigned) in vehicles.iter().zip(assignments) {
            if assigned.is_empty() {
                continue;
            }

            // Nearest-neighbour sequencing from the warehouse.
            let mut steps = Vec::with_capacity(assigned.len());
            let mut position = warehouse.location;
            let mut clock: i64 = 0;
            while !assigned.is_empty() {
                let (idx, _) = assigned
                    .iter()
                    .enumerate()
                    .map(|(i, o)| (i, position.distance_km(&o.location)))
                    .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
                    .expect("assigned is non-empty");
                let order = assigned.remove(idx);

                let leg_secs =
                    (position.distance_km(&order.location) / TRAVEL_SPEED_KMH * 3600.0) as i64;
                clock += leg_secs + STOP_SERVICE_SECS;
                steps.push(JobStep {
                    location: order.location,
                    arrival_offset_secs: clock,
                    parcel_id: order.parcel_id,
                });
                position = order.location;
            }

            // Return leg back to the warehouse.
            let return_secs =
                (position.distance_km(&warehouse.location) / TRAVEL_SPEED_KMH * 3600.0) as i64;
            routes.push(PlannedRoute {
                vehicle_id: vehicle.id.clone(),
                duration_secs: clock + return_secs,
                steps,
            });
        }

        Ok(routes)
    }
}
