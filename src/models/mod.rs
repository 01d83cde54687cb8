//! Request and Response models for the HTTP API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies, and the
//! `User` entity stored through the cache.

pub mod requests;
pub mod responses;
pub mod user;

// Re-export commonly used types
pub use requests::{SetValueRequest, DEFAULT_USER_TTL_MS};
pub use responses::{ErrorResponse, HealthResponse, SetValueResponse};
pub use user::User;
