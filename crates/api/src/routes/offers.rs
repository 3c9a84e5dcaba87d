//! Offer endpoints: seeding quotes and accepting them.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::NaiveDate;
use common::Location;
use event_store::EventStore;
use saga::{AcceptOffer, BuyerId, Offer, OfferId};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::state::AppState;

#[derive(Deserialize)]
pub struct CreateOfferRequest {
    pub price_cents: i64,
    pub pickup_date: NaiveDate,
    pub delivery_date: NaiveDate,
    pub pickup_city: String,
    pub delivery_city: String,
}

#[derive(Serialize)]
pub struct OfferCreatedResponse {
    pub offer_id: String,
}

#[derive(Deserialize)]
pub struct AcceptOfferRequest {
    /// Existing buyer, or absent for a first-time buyer.
    pub buyer_id: Option<uuid::Uuid>,
    pub pickup_location: Location,
    pub delivery_location: Location,
}

#[derive(Serialize)]
pub struct OfferAcceptedResponse {
    pub parcel_id: String,
    pub buyer_id: String,
}

/// POST /offers — registers a priced quote with the pricing collaborator.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateOfferRequest>,
) -> Result<(StatusCode, Json<OfferCreatedResponse>), ApiError> {
    let offer = Offer {
        offer_id: OfferId::new(),
        price_cents: req.price_cents,
        pickup_date: req.pickup_date,
        delivery_date: req.delivery_date,
        pickup_city: req.pickup_city,
        delivery_city: req.delivery_city,
    };
    let offer_id = offer.offer_id;
    state.pricing.add_offer(offer);

    Ok((
        StatusCode::CREATED,
        Json(OfferCreatedResponse {
            offer_id: offer_id.to_string(),
        }),
    ))
}

/// POST /offers/{id}/accept — runs the accept-offer saga.
#[tracing::instrument(skip(state, req))]
pub async fn accept<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<AcceptOfferRequest>,
) -> Result<(StatusCode, Json<OfferAcceptedResponse>), ApiError> {
    let buyer_id = req
        .buyer_id
        .map(BuyerId::from_uuid)
        .unwrap_or_else(BuyerId::new);

    let parcel_id = state
        .coordinator
        .execute(AcceptOffer {
            offer_id: OfferId::from_uuid(id),
            buyer_id,
            pickup_location: req.pickup_location,
            delivery_location: req.delivery_location,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(OfferAcceptedResponse {
            parcel_id: parcel_id.to_string(),
            buyer_id: buyer_id.to_string(),
        }),
    ))
}
