//! Value objects for the parcel domain.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Warehouse identifier (operator-assigned code, e.g. "WH-BER").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WarehouseId(String);

impl WarehouseId {
    /// Creates a new warehouse ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the warehouse ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WarehouseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for WarehouseId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for WarehouseId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for WarehouseId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Vehicle identifier (fleet-assigned code, e.g. "V-104").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(String);

impl VehicleId {
    /// Creates a new vehicle ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the vehicle ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VehicleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VehicleId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VehicleId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier for a vehicle job or a transfer job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Creates a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a job ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The ordered warehouses a parcel passes through between pickup and
/// delivery: one when pickup and delivery share a warehouse, two when an
/// inter-warehouse transfer is required. Fixed at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitPlan {
    warehouses: Vec<WarehouseId>,
}

impl TransitPlan {
    /// Single-hop plan: pickup and delivery are served by the same warehouse.
    pub fn direct(warehouse: WarehouseId) -> Self {
        Self {
            warehouses: vec![warehouse],
        }
    }

    /// Two-hop plan with a transfer leg. Collapses to a direct plan when
    /// both endpoints resolved to the same warehouse.
    pub fn via(pickup: WarehouseId, delivery: WarehouseId) -> Self {
        if pickup == delivery {
            Self::direct(pickup)
        } else {
            Self {
                warehouses: vec![pickup, delivery],
            }
        }
    }

    /// The warehouses in transit order.
    pub fn warehouses(&self) -> &[WarehouseId] {
        &self.warehouses
    }

    /// The warehouse serving the pickup endpoint.
    pub fn first(&self) -> &WarehouseId {
        &self.warehouses[0]
    }

    /// The warehouse serving the delivery endpoint.
    pub fn last(&self) -> &WarehouseId {
        &self.warehouses[self.warehouses.len() - 1]
    }

    /// Returns true if the given warehouse is the last hop.
    pub fn is_final(&self, warehouse: &WarehouseId) -> bool {
        self.last() == warehouse
    }

    /// The warehouse following `warehouse` in the plan, if any.
    pub fn next_after(&self, warehouse: &WarehouseId) -> Option<&WarehouseId> {
        let pos = self.warehouses.iter().position(|w| w == warehouse)?;
        self.warehouses.get(pos + 1)
    }

    /// Returns true if the plan includes a transfer leg.
    pub fn requires_transfer(&self) -> bool {
        self.warehouses.len() == 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_plan_has_one_hop() {
        let plan = TransitPlan::direct(WarehouseId::new("WH-A"));
        assert_eq!(plan.warehouses().len(), 1);
        assert!(!plan.requires_transfer());
        assert!(plan.is_final(&WarehouseId::new("WH-A")));
    }

    #[test]
    fn via_plan_has_two_hops() {
        let plan = TransitPlan::via(WarehouseId::new("WH-A"), WarehouseId::new("WH-B"));
        assert_eq!(plan.warehouses().len(), 2);
        assert!(plan.requires_transfer());
        assert!(!plan.is_final(&WarehouseId::new("WH-A")));
        assert!(plan.is_final(&WarehouseId::new("WH-B")));
    }

    #[test]
    fn via_with_equal_endpoints_collapses_to_direct() {
        let plan = TransitPlan::via(WarehouseId::new("WH-A"), WarehouseId::new("WH-A"));
        assert_eq!(plan.warehouses().len(), 1);
    }

    #[test]
    fn next_after_walks_the_plan() {
        let plan = TransitPlan::via(WarehouseId::new("WH-A"), WarehouseId::new("WH-B"));
        assert_eq!(
            plan.next_after(&WarehouseId::new("WH-A")),
            Some(&WarehouseId::new("WH-B"))
        );
        assert_eq!(plan.next_after(&WarehouseId::new("WH-B")), None);
        assert_eq!(plan.next_after(&WarehouseId::new("WH-X")), None);
    }

    #[test]
    fn serialization_is_a_plain_list() {
        let plan = TransitPlan::via(WarehouseId::new("WH-A"), WarehouseId::new("WH-B"));
        let json = serde_json::to_string(&plan).unwrap();
        assert_eq!(json, r#"["WH-A","WH-B"]"#);
        let back: TransitPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plan);
    }
}
