//! Read models and projections: the query side of the parcel system.
//!
//! This crate provides:
//! - [`Projection`] trait for processing events into read models
//! - [`ReadModel`] trait for query access to denormalized data
//! - [`ProjectionProcessor`] for feeding events from the store to projections
//! - Two views: parcels currently underway, and each parcel's full journey

pub mod error;
pub mod processor;
pub mod projection;
pub mod read_model;
pub mod views;

pub use error::{ProjectionError, Result};
pub use processor::ProjectionProcessor;
pub use projection::{Projection, ProjectionPosition};
pub use read_model::ReadModel;
pub use views::{CurrentParcelsView, JourneyEntry, ParcelJourneyView, ParcelSummary};
