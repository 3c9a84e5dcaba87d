//! Accept-offer saga.
//!
//! Accepting a priced offer spans independently-failing collaborators:
//! pricing, the parcel event stream, the buyer directory and the order
//! book. Instead of a distributed ACID transaction, the coordinator runs
//! an ordered list of steps where each successful step contributes a
//! compensating action; on the first failure the accumulated compensations
//! unwind in reverse order.
//!
//! The saga holds no durable state. The compensation stack lives for one
//! run and is discarded whatever the outcome; a crash mid-saga is repaired
//! by the caller retrying, not by automatic recovery.

pub mod buyers;
pub mod coordinator;
pub mod error;
pub mod pricing;
pub mod runner;

pub use buyers::{BuyerDirectory, BuyerId, InMemoryBuyerDirectory};
pub use coordinator::{AcceptOffer, AcceptOfferCoordinator};
pub use error::{CompensationFailure, SagaError, StepFailure};
pub use pricing::{InMemoryPricingService, Offer, OfferId, PricingService};
pub use runner::{Compensation, SagaStep, run_saga};
