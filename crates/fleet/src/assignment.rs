//! Warehouse assignment.
//!
//! Picks a parcel's transit plan at registration time: the warehouse
//! serving each endpoint is the closest one that covers the endpoint
//! within its own service radius. The choice is made once and is
//! immutable afterwards, even if warehouse conditions change.

use common::Location;
use domain::TransitPlan;

use crate::error::{FleetError, Result};
use crate::records::{Warehouse, WarehouseStatus};

/// Selects the transit plan for a pickup/delivery pair.
///
/// Warehouses that do not cover an endpoint within their own range are
/// excluded entirely, not just deprioritized. If both endpoints resolve to
/// the same warehouse the plan is single-hop; otherwise the parcel needs a
/// transfer leg between the two.
pub fn plan_transit(
    warehouses: &[Warehouse],
    pickup: Location,
    delivery: Location,
) -> Result<TransitPlan> {
    let pickup_warehouse =
        nearest_covering(warehouses, &pickup).ok_or(FleetError::NoWarehouseInRange(pickup))?;
    let delivery_warehouse =
        nearest_covering(warehouses, &delivery).ok_or(FleetError::NoWarehouseInRange(delivery))?;

    tracing::debug!(
        pickup_warehouse = %pickup_warehouse.id,
        delivery_warehouse = %delivery_warehouse.id,
        "transit plan selected"
    );

    Ok(TransitPlan::via(
        pickup_warehouse.id.clone(),
        delivery_warehouse.id.clone(),
    ))
}

/// The closest available warehouse whose own range covers the point.
fn nearest_covering<'a>(warehouses: &'a [Warehouse], point: &Location) -> Option<&'a Warehouse> {
    warehouses
        .iter()
        .filter(|w| w.status == WarehouseStatus::Available && w.covers(point))
        .min_by(|a, b| {
            let da = a.location.distance_km(point);
            let db = b.location.distance_km(point);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
}
