//! HTTP API server with observability for the parcel system.
//!
//! Provides REST endpoints for offer acceptance, parcel registration and
//! queries, vehicle tracking, and the administrative triggers that drive
//! job batching and the progress sweep, with structured logging (tracing)
//! and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use dispatch::{
    ActiveSet, InMemoryNoticeBus, InMemoryRouteOptimizer, JobOrchestrator, ProgressGenerator,
    VehicleTracker,
};
use domain::ParcelService;
use event_store::EventStore;
use fleet::InMemoryFleetStore;
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{AcceptOfferCoordinator, InMemoryBuyerDirectory, InMemoryPricingService};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracking::{CurrentParcelsView, ParcelJourneyView, Projection, ProjectionProcessor};

use routes::state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: EventStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/offers", post(routes::offers::create::<S>))
        .route("/offers/{id}/accept", post(routes::offers::accept::<S>))
        .route("/parcels", post(routes::parcels::register::<S>))
        .route("/parcels", get(routes::parcels::list::<S>))
        .route("/parcels/{id}", get(routes::parcels::get::<S>))
        .route("/parcels/{id}/events", get(routes::parcels::events::<S>))
        .route("/parcels/{id}/journey", get(routes::parcels::journey::<S>))
        .route(
            "/vehicles/{id}/location",
            get(routes::vehicles::location::<S>),
        )
        .route(
            "/admin/warehouses",
            post(routes::admin::put_warehouse::<S>),
        )
        .route("/admin/vehicles", post(routes::admin::put_vehicle::<S>))
        .route(
            "/admin/vehicles/reset",
            post(routes::admin::reset_vehicles::<S>),
        )
        .route("/admin/jobs/prepare", post(routes::admin::prepare_jobs::<S>))
        .route("/admin/jobs/advance", post(routes::admin::advance_jobs::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state with in-memory stores and
/// collaborator doubles, wiring every component off one event store.
pub fn create_default_state<S: EventStore + Clone + 'static>(
    event_store: S,
) -> (Arc<AppState<S>>, Arc<ProjectionProcessor<S>>) {
    let parcels = Arc::new(ParcelService::new(event_store.clone()));
    let fleet = InMemoryFleetStore::new();
    let pricing = InMemoryPricingService::new();
    let buyers = InMemoryBuyerDirectory::new();
    let optimizer = InMemoryRouteOptimizer::new();
    let bus = InMemoryNoticeBus::new();
    let active = ActiveSet::new();
    let tracker = VehicleTracker::new();

    let coordinator = AcceptOfferCoordinator::new(
        parcels.clone(),
        fleet.clone(),
        pricing.clone(),
        buyers.clone(),
    );
    let orchestrator = Arc::new(JobOrchestrator::new(
        fleet.clone(),
        optimizer.clone(),
        bus.clone(),
        parcels.clone(),
        active.clone(),
    ));
    let generator = ProgressGenerator::new(
        fleet.clone(),
        parcels.clone(),
        orchestrator.clone(),
        bus.clone(),
        active,
        tracker.clone(),
    );

    let current_parcels = Arc::new(CurrentParcelsView::new());
    let journeys = Arc::new(ParcelJourneyView::new());

    let mut processor = ProjectionProcessor::new(event_store.clone());
    processor.register(Box::new(current_parcels.as_ref().clone()) as Box<dyn Projection>);
    processor.register(Box::new(journeys.as_ref().clone()) as Box<dyn Projection>);
    let processor = Arc::new(processor);

    let state = Arc::new(AppState {
        parcels,
        coordinator,
        orchestrator,
        generator,
        fleet,
        pricing,
        current_parcels,
        journeys,
        tracker,
        event_store,
        processor: processor.clone(),
    });

    (state, processor)
}
