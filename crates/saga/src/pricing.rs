//! Pricing service trait and in-memory implementation.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SagaError;

/// Unique identifier for a priced offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OfferId(Uuid);

impl OfferId {
    /// Creates a new random offer ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an offer ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for OfferId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OfferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A priced offer as the pricing collaborator reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    pub offer_id: OfferId,
    /// Quoted price in cents.
    pub price_cents: i64,
    /// The pickup day the quote was computed for.
    pub pickup_date: NaiveDate,
    /// The delivery day the quote was computed for.
    pub delivery_date: NaiveDate,
    /// City codenames of the quoted endpoints.
    pub pickup_city: String,
    pub delivery_city: String,
}

/// Trait for the pricing collaborator.
#[async_trait]
pub trait PricingService: Send + Sync {
    /// Looks up an offer. Returns None for unknown IDs.
    async fn get_offer(&self, offer_id: OfferId) -> Result<Option<Offer>, SagaError>;

    /// Marks the offer as accepted.
    async fn accept_offer(&self, offer_id: OfferId) -> Result<(), SagaError>;

    /// Marks a previously accepted offer as accept-cancelled.
    async fn cancel_accept(&self, offer_id: OfferId) -> Result<(), SagaError>;
}

#[derive(Debug, Default)]
struct InMemoryPricingState {
    offers: HashMap<OfferId, Offer>,
    accepted: HashSet<OfferId>,
    cancelled: HashSet<OfferId>,
    fail_on_accept: bool,
    fail_on_cancel: bool,
}

/// In-memory pricing service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPricingService {
    state: Arc<RwLock<InMemoryPricingState>>,
}

impl InMemoryPricingService {
    /// Creates a new in-memory pricing service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an offer that get_offer will find.
    pub fn add_offer(&self, offer: Offer) {
        self.state
            .write()
            .unwrap()
            .offers
            .insert(offer.offer_id, offer);
    }

    /// Configures the service to fail the next accept call.
    pub fn set_fail_on_accept(&self, fail: bool) {
        self.state.write().unwrap().fail_on_accept = fail;
    }

    /// Configures the service to fail the next cancel call.
    pub fn set_fail_on_cancel(&self, fail: bool) {
        self.state.write().unwrap().fail_on_cancel = fail;
    }

    /// Returns true if the offer is currently accepted.
    pub fn is_accepted(&self, offer_id: OfferId) -> bool {
        self.state.read().unwrap().accepted.contains(&offer_id)
    }

    /// Returns true if the offer was accept-cancelled.
    pub fn is_cancelled(&self, offer_id: OfferId) -> bool {
        self.state.read().unwrap().cancelled.contains(&offer_id)
    }
}

#[async_trait]
impl PricingService for InMemoryPricingService {
    async fn get_offer(&self, offer_id: OfferId) -> Result<Option<Offer>, SagaError> {
        Ok(self.state.read().unwrap().offers.get(&offer_id).cloned())
    }

    async fn accept_offer(&self, offer_id: OfferId) -> Result<(), SagaError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_accept {
            return Err(SagaError::Pricing("accept rejected".to_string()));
        }
        if !state.offers.contains_key(&offer_id) {
            return Err(SagaError::OfferNotFound(offer_id));
        }

        state.accepted.insert(offer_id);
        Ok(())
    }

    async fn cancel_accept(&self, offer_id: OfferId) -> Result<(), SagaError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_cancel {
            return Err(SagaError::Pricing("cancel rejected".to_string()));
        }

        state.accepted.remove(&offer_id);
        state.cancelled.insert(offer_id);
        Ok(())
    }
}
