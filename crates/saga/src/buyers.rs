//! Buyer directory trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::AggregateId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SagaError;

/// Unique identifier for a buyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuyerId(Uuid);

impl BuyerId {
    /// Creates a new random buyer ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a buyer ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for BuyerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BuyerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trait for the buyer directory collaborator.
#[async_trait]
pub trait BuyerDirectory: Send + Sync {
    /// Attaches a parcel to the buyer's record, creating the record if
    /// this is the buyer's first parcel.
    async fn attach_parcel(&self, buyer_id: BuyerId, parcel_id: AggregateId)
    -> Result<(), SagaError>;

    /// Detaches a parcel from the buyer's record.
    async fn detach_parcel(&self, buyer_id: BuyerId, parcel_id: AggregateId)
    -> Result<(), SagaError>;
}

#[derive(Debug, Default)]
struct InMemoryBuyerState {
    parcels: HashMap<BuyerId, Vec<AggregateId>>,
    fail_on_attach: bool,
    fail_on_detach: bool,
}

/// In-memory buyer directory for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBuyerDirectory {
    state: Arc<RwLock<InMemoryBuyerState>>,
}

impl InMemoryBuyerDirectory {
    /// Creates a new in-memory buyer directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the directory to fail the next attach call.
    pub fn set_fail_on_attach(&self, fail: bool) {
        self.state.write().unwrap().fail_on_attach = fail;
    }

    /// Configures the directory to fail the next detach call.
    pub fn set_fail_on_detach(&self, fail: bool) {
        self.state.write().unwrap().fail_on_detach = fail;
    }

    /// Returns the parcels attached to a buyer.
    pub fn parcels_for(&self, buyer_id: BuyerId) -> Vec<AggregateId> {
        self.state
            .read()
            .unwrap()
            .parcels
            .get(&buyer_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl BuyerDirectory for InMemoryBuyerDirectory {
    async fn attach_parcel(
        &self,
        buyer_id: BuyerId,
        parcel_id: AggregateId,
    ) -> Result<(), SagaError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_attach {
            return Err(SagaError::BuyerDirectory("attach rejected".to_string()));
        }

        state.parcels.entry(buyer_id).or_default().push(parcel_id);
        Ok(())
    }

    async fn detach_parcel(
        &self,
        buyer_id: BuyerId,
        parcel_id: AggregateId,
    ) -> Result<(), SagaError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_detach {
            return Err(SagaError::BuyerDirectory("detach rejected".to_string()));
        }

        if let Some(parcels) = state.parcels.get_mut(&buyer_id) {
            parcels.retain(|p| *p != parcel_id);
        }
        Ok(())
    }
}
