//! Error types for the payment orchestration service.

use crate::domain::PaymentId;

/// Domain-level errors (invalid values).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unknown gateway factory: {0}")]
    UnknownFactory(String),
}

/// Repository-level errors (data access failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Errors raised by a gateway while executing a request.
///
/// An interactive redirect is not an error; see `ports::Execution`.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Gateway misconfigured: {0}")]
    Misconfigured(String),

    #[error("Payment declined: {0}")]
    Declined(String),

    #[error("Gateway unavailable: {0}")]
    Unavailable(String),
}

/// Application-level errors (for HTTP responses).
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Payment has no persisted identity")]
    InvalidPayment,

    #[error("Token not found")]
    TokenNotFound,

    #[error("Payment not found: {0}")]
    PaymentNotFound(PaymentId),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unknown gateway: {0}")]
    UnknownGateway(String),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Domain(DomainError::ValidationError(msg)) => AppError::InvalidRequest(msg),
            RepoError::Domain(e) => AppError::InvalidRequest(e.to_string()),
            RepoError::NotFound => AppError::NotFound("Resource not found".into()),
            RepoError::DuplicateKey(key) => AppError::Conflict(format!("{} already exists", key)),
            RepoError::Conflict(e) => AppError::Conflict(e),
            RepoError::Database(e) => AppError::Internal(e),
        }
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::ValidationError(msg) => AppError::InvalidRequest(msg),
            e @ DomainError::UnknownFactory(_) => AppError::InvalidRequest(e.to_string()),
        }
    }
}
