//! Coordinator for the accept-offer saga.

use std::sync::Arc;

use common::{AggregateId, Location};
use domain::{ParcelService, RegisterParcel, TransitPlan};
use event_store::EventStore;
use fleet::{FleetStore, Order, RouteKind, plan_transit};
use tokio::sync::RwLock;

use crate::buyers::{BuyerDirectory, BuyerId};
use crate::error::SagaError;
use crate::pricing::{OfferId, PricingService};
use crate::runner::{Compensation, SagaStep, run_saga};

/// Request to accept a priced offer and create the parcel behind it.
#[derive(Debug, Clone)]
pub struct AcceptOffer {
    /// The offer being accepted.
    pub offer_id: OfferId,

    /// The buyer the new parcel belongs to.
    pub buyer_id: BuyerId,

    /// Where the parcel is collected.
    pub pickup_location: Location,

    /// Where the parcel is delivered.
    pub delivery_location: Location,
}

/// Orchestrates the accept-offer saga.
///
/// The step sequence and its compensations:
/// 1. mark the offer accepted           ⟲ mark it accept-cancelled
/// 2. assign warehouses + register the parcel ⟲ discard the parcel stream
/// 3. attach the parcel to the buyer    ⟲ detach it
/// 4. create the pickup order (terminal, no compensation)
///
/// On success the caller gets the new parcel's ID. On failure everything
/// the saga did has been undone, or the error reports exactly which
/// compensations could not run.
pub struct AcceptOfferCoordinator<S, F, P, B>
where
    S: EventStore,
    F: FleetStore,
    P: PricingService,
    B: BuyerDirectory,
{
    parcels: Arc<ParcelService<S>>,
    fleet: F,
    pricing: P,
    buyers: B,
}

impl<S, F, P, B> AcceptOfferCoordinator<S, F, P, B>
where
    S: EventStore + Send + Sync + 'static,
    F: FleetStore + Clone + Send + Sync + 'static,
    P: PricingService + Clone + Send + Sync + 'static,
    B: BuyerDirectory + Clone + Send + Sync + 'static,
{
    /// Creates a new coordinator over explicit collaborator handles.
    pub fn new(parcels: Arc<ParcelService<S>>, fleet: F, pricing: P, buyers: B) -> Self {
        Self {
            parcels,
            fleet,
            pricing,
            buyers,
        }
    }

    /// Runs the accept-offer saga.
    ///
    /// A missing offer fails before any step runs, so there is nothing to
    /// compensate in that case.
    #[tracing::instrument(skip(self), fields(offer_id = %cmd.offer_id))]
    pub async fn execute(&self, cmd: AcceptOffer) -> Result<AggregateId, SagaError> {
        metrics::counter!("saga_executions_total").increment(1);
        let saga_start = std::time::Instant::now();

        let offer = self
            .pricing
            .get_offer(cmd.offer_id)
            .await?
            .ok_or(SagaError::OfferNotFound(cmd.offer_id))?;

        let parcel_id = AggregateId::new();

        // The transit plan is chosen inside step 2 but the terminal step
        // needs it too; it travels between them in this slot.
        let plan_slot: Arc<RwLock<Option<TransitPlan>>> = Arc::default();

        let accept = SagaStep::new("accept_offer", {
            let pricing = self.pricing.clone();
            let offer_id = cmd.offer_id;
            move || async move {
                pricing
                    .accept_offer(offer_id)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(Some(Compensation::new("accept_offer", move || async move {
                    pricing
                        .cancel_accept(offer_id)
                        .await
                        .map_err(|e| e.to_string())
                })))
            }
        });

        let register = SagaStep::new("register_parcel", {
            let fleet = self.fleet.clone();
            let parcels = self.parcels.clone();
            let plan_slot = plan_slot.clone();
            let pickup_date = offer.pickup_date;
            let delivery_date = offer.delivery_date;
            let pickup = cmd.pickup_location;
            let delivery = cmd.delivery_location;
            move || async move {
                let warehouses = fleet
                    .available_warehouses()
                    .await
                    .map_err(|e| e.to_string())?;
                let plan = plan_transit(&warehouses, pickup, delivery)
                    .map_err(|e| e.to_string())?;
                *plan_slot.write().await = Some(plan.clone());

                parcels
                    .register(RegisterParcel {
                        parcel_id,
                        pickup_date,
                        pickup_location: pickup,
                        delivery_date,
                        delivery_location: delivery,
                        transit_warehouses: plan,
                    })
                    .await
                    .map_err(|e| e.to_string())?;

                Ok(Some(Compensation::new(
                    "register_parcel",
                    move || async move {
                        parcels.discard(parcel_id).await.map_err(|e| e.to_string())
                    },
                )))
            }
        });

        let attach = SagaStep::new("attach_buyer", {
            let buyers = self.buyers.clone();
            let buyer_id = cmd.buyer_id;
            move || async move {
                buyers
                    .attach_parcel(buyer_id, parcel_id)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(Some(Compensation::new("attach_buyer", move || async move {
                    buyers
                        .detach_parcel(buyer_id, parcel_id)
                        .await
                        .map_err(|e| e.to_string())
                })))
            }
        });

        // Terminal step: once the pickup order exists the job orchestrator
        // owns the parcel's fate, so there is nothing left to unwind.
        let schedule_pickup = SagaStep::new("create_pickup_order", {
            let fleet = self.fleet.clone();
            let plan_slot = plan_slot.clone();
            let pickup_date = offer.pickup_date;
            let pickup = cmd.pickup_location;
            move || async move {
                let plan = plan_slot
                    .read()
                    .await
                    .clone()
                    .ok_or_else(|| "transit plan missing".to_string())?;
                let warehouse = fleet
                    .get_warehouse(plan.first())
                    .await
                    .map_err(|e| e.to_string())?
                    .ok_or_else(|| format!("warehouse {} not found", plan.first()))?;

                fleet
                    .put_order(Order {
                        parcel_id,
                        kind: RouteKind::Pickup,
                        warehouse_id: warehouse.id.clone(),
                        date: pickup_date,
                        location: pickup,
                        warehouse,
                    })
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(None)
            }
        });

        let result = run_saga(vec![accept, register, attach, schedule_pickup]).await;

        let duration = saga_start.elapsed().as_secs_f64();
        metrics::histogram!("saga_duration_seconds").record(duration);

        match result {
            Ok(()) => {
                metrics::counter!("saga_completed_total").increment(1);
                tracing::info!(%parcel_id, duration, "accept-offer saga completed");
                Ok(parcel_id)
            }
            Err(err) => {
                metrics::counter!("saga_failed_total").increment(1);
                tracing::warn!(%parcel_id, error = %err, "accept-offer saga failed");
                Err(err)
            }
        }
    }
}
