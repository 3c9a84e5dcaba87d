//! Parcel lifecycle state machine.

use serde::{Deserialize, Serialize};

/// The status of a parcel on its journey.
///
/// Transitions:
/// ```text
/// ToPickup ──► TransitToWarehouse ──► InWarehouse ──► TransitToCustomer ──► Delivered
///                      │                   ▲
///                      ▼                   │ (arrival at last warehouse)
///                 ToTransfer ──► Transfer ─┘
///                      ▲             │
///                      └─────────────┘ (arrival with hops remaining)
/// ```
///
/// Arrival at a warehouse (direct or via transfer) yields `InWarehouse` when
/// that warehouse is the last of the parcel's transit plan, `ToTransfer`
/// otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParcelStatus {
    /// Waiting for a pickup vehicle.
    #[default]
    ToPickup,

    /// On a pickup vehicle, heading to the first transit warehouse.
    TransitToWarehouse,

    /// At an intermediate warehouse, waiting for the nightly transfer.
    ToTransfer,

    /// On the nightly inter-warehouse transfer.
    Transfer,

    /// At the final transit warehouse, waiting for delivery.
    InWarehouse,

    /// On a delivery vehicle, heading to the customer.
    TransitToCustomer,

    /// Delivered to the customer (terminal state).
    Delivered,
}

impl ParcelStatus {
    /// Returns true if a pickup can be recorded in this status.
    pub fn can_pick_up(&self) -> bool {
        matches!(self, ParcelStatus::ToPickup)
    }

    /// Returns true if a direct warehouse arrival can be recorded.
    pub fn can_arrive_at_warehouse(&self) -> bool {
        matches!(self, ParcelStatus::TransitToWarehouse)
    }

    /// Returns true if a transfer can start in this status.
    pub fn can_start_transfer(&self) -> bool {
        matches!(self, ParcelStatus::ToTransfer)
    }

    /// Returns true if a transfer arrival can be recorded.
    pub fn can_complete_transfer(&self) -> bool {
        matches!(self, ParcelStatus::Transfer)
    }

    /// Returns true if the final delivery leg can start.
    pub fn can_start_delivery(&self) -> bool {
        matches!(self, ParcelStatus::InWarehouse)
    }

    /// Returns true if final delivery can be recorded.
    pub fn can_deliver(&self) -> bool {
        matches!(self, ParcelStatus::TransitToCustomer)
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ParcelStatus::Delivered)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParcelStatus::ToPickup => "TO_PICKUP",
            ParcelStatus::TransitToWarehouse => "TRANSIT_TO_WAREHOUSE",
            ParcelStatus::ToTransfer => "TO_TRANSFER",
            ParcelStatus::Transfer => "TRANSFER",
            ParcelStatus::InWarehouse => "IN_WAREHOUSE",
            ParcelStatus::TransitToCustomer => "TRANSIT_TO_CUSTOMER",
            ParcelStatus::Delivered => "DELIVERED",
        }
    }
}

impl std::fmt::Display for ParcelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
