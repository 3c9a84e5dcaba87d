//! Shared application state.

use std::sync::Arc;

use dispatch::{
    InMemoryNoticeBus, InMemoryRouteOptimizer, JobOrchestrator, ProgressGenerator, VehicleTracker,
};
use domain::ParcelService;
use event_store::EventStore;
use fleet::InMemoryFleetStore;
use saga::{AcceptOfferCoordinator, InMemoryBuyerDirectory, InMemoryPricingService};
use tracking::{CurrentParcelsView, ParcelJourneyView, ProjectionProcessor};

/// Shared application state accessible from all handlers.
pub struct AppState<S: EventStore> {
    pub parcels: Arc<ParcelService<S>>,
    pub coordinator: AcceptOfferCoordinator<
        S,
        InMemoryFleetStore,
        InMemoryPricingService,
        InMemoryBuyerDirectory,
    >,
    pub orchestrator:
        Arc<JobOrchestrator<S, InMemoryFleetStore, InMemoryRouteOptimizer, InMemoryNoticeBus>>,
    pub generator:
        ProgressGenerator<S, InMemoryFleetStore, InMemoryRouteOptimizer, InMemoryNoticeBus>,
    pub fleet: InMemoryFleetStore,
    pub pricing: InMemoryPricingService,
    pub current_parcels: Arc<CurrentParcelsView>,
    pub journeys: Arc<ParcelJourneyView>,
    pub tracker: VehicleTracker,
    pub event_store: S,
    pub processor: Arc<ProjectionProcessor<S>>,
}
