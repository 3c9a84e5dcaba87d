//! Read model views.

mod current_parcels;
mod parcel_journey;

pub use current_parcels::{CurrentParcelsView, ParcelSummary};
pub use parcel_journey::{JourneyEntry, ParcelJourneyView};
