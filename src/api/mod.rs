//! API Module
//!
//! HTTP handlers and routing for the cache demo service.
//!
//! # Endpoints
//! - `GET /user/:key` - Describe the value stored at a key
//! - `PUT /user/:key` - Store a value with a TTL if the key is absent
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
