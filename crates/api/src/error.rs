//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dispatch::DispatchError;
use domain::{DomainError, ParcelError};
use event_store::EventStoreError;
use fleet::FleetError;
use saga::SagaError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Saga execution error.
    Saga(SagaError),
    /// Dispatch layer error.
    Dispatch(DispatchError),
    /// Fleet record error.
    Fleet(FleetError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Saga(err) => saga_error_to_response(err),
            ApiError::Dispatch(err) => dispatch_error_to_response(err),
            ApiError::Fleet(err) => (StatusCode::NOT_FOUND, err.to_string()),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::Parcel(parcel_err) => match parcel_err {
            ParcelError::InvalidTransition { .. } | ParcelError::NotAtFinalWarehouse { .. } => {
                (StatusCode::CONFLICT, err.to_string())
            }
            ParcelError::AlreadyRegistered => (StatusCode::BAD_REQUEST, err.to_string()),
        },
        DomainError::AggregateNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        DomainError::EventStore(EventStoreError::ConcurrencyConflict { .. }) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

fn saga_error_to_response(err: SagaError) -> (StatusCode, String) {
    match &err {
        SagaError::OfferNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        // The saga rolled back cleanly; the collaborator it stumbled on is
        // the problem.
        SagaError::StepFailed(_) | SagaError::Pricing(_) | SagaError::BuyerDirectory(_) => {
            (StatusCode::BAD_GATEWAY, err.to_string())
        }
        // Dirty rollback: requires operator attention.
        SagaError::CompensationFailed { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

fn dispatch_error_to_response(err: DispatchError) -> (StatusCode, String) {
    match &err {
        DispatchError::NoVehiclesAvailable { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        DispatchError::Fleet(_) => (StatusCode::NOT_FOUND, err.to_string()),
        DispatchError::Optimizer(_) => (StatusCode::BAD_GATEWAY, err.to_string()),
        DispatchError::ParcelNotRoutable(_) => (StatusCode::CONFLICT, err.to_string()),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        ApiError::Saga(err)
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        ApiError::Dispatch(err)
    }
}

impl From<FleetError> for ApiError {
    fn from(err: FleetError) -> Self {
        ApiError::Fleet(err)
    }
}
