//! Error types for the cache client and server
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for cache operations.
///
/// `InvalidArgument` is raised by the client before any store round trip.
/// Every other variant comes from the store and is passed through unchanged.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Rejected argument (empty key, empty field, empty batch, zero TTL)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation against a key holding a different shape
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    /// Stored value cannot be parsed as a 64-bit integer
    #[error("value is not an integer or out of range")]
    NotAnInteger,

    /// Stored score cannot be parsed as a float
    #[error("value is not a valid float")]
    NotAFloat,

    /// Error reported by the Redis connection
    #[error("Redis error: {0}")]
    Redis(#[source] redis::RedisError),

    /// Value could not be encoded or decoded as JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Shorthand for an `InvalidArgument` naming the operation and argument.
    pub fn invalid(op: &str, what: &str) -> Self {
        CacheError::InvalidArgument(format!("{op}: {what}"))
    }
}

// == Redis Error Classification ==
/// Server replies that have a dedicated variant are mapped to it so both
/// stores report the same errors.
impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.code() == Some("WRONGTYPE") {
            return CacheError::WrongType;
        }
        match err.detail() {
            Some(detail)
                if detail.contains("not an integer") || detail.contains("would overflow") =>
            {
                CacheError::NotAnInteger
            }
            Some(detail)
                if detail.contains("not a valid float") || detail.contains("not a number") =>
            {
                CacheError::NotAFloat
            }
            _ => CacheError::Redis(err),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            CacheError::WrongType | CacheError::NotAnInteger | CacheError::NotAFloat => {
                StatusCode::CONFLICT
            }
            CacheError::Redis(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Serialization(_) | CacheError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
