//! Saga error types.

use domain::DomainError;
use event_store::EventStoreError;
use thiserror::Error;

use crate::pricing::OfferId;

/// The failure that stopped a saga's forward progress.
#[derive(Debug, Clone)]
pub struct StepFailure {
    /// The step that failed.
    pub step: &'static str,
    /// Why it failed.
    pub reason: String,
}

impl std::fmt::Display for StepFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "step '{}' failed: {}", self.step, self.reason)
    }
}

/// A compensating action that itself failed during the unwind.
#[derive(Debug, Clone)]
pub struct CompensationFailure {
    /// The step whose compensation failed.
    pub step: &'static str,
    /// Why the compensation failed.
    pub reason: String,
}

impl std::fmt::Display for CompensationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "compensation for '{}' failed: {}", self.step, self.reason)
    }
}

/// Errors that can occur during saga execution.
#[derive(Debug, Error)]
pub enum SagaError {
    /// The referenced offer does not exist.
    #[error("Offer not found: {0}")]
    OfferNotFound(OfferId),

    /// A step failed and every accumulated compensation succeeded: the
    /// system is back where it started.
    #[error("Saga failed: {0}")]
    StepFailed(StepFailure),

    /// A step failed AND at least one compensation failed during the
    /// unwind. Both the original failure and the broken compensations are
    /// preserved so neither cause is lost.
    #[error("Saga compensation failed after {original} ({} compensation(s) failed)", failures.len())]
    CompensationFailed {
        original: StepFailure,
        failures: Vec<CompensationFailure>,
    },

    /// Pricing collaborator error outside the step sequence.
    #[error("Pricing service error: {0}")]
    Pricing(String),

    /// Buyer directory collaborator error outside the step sequence.
    #[error("Buyer directory error: {0}")]
    BuyerDirectory(String),

    /// Domain error.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Event store error.
    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
