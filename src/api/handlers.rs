//! API Handlers
//!
//! HTTP request handlers for each endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{info, warn};

use crate::cache::{CacheClient, MemoryStore};
use crate::config::{Backend, Config};
use crate::error::{CacheError, Result};
use crate::models::{HealthResponse, SetValueRequest, SetValueResponse};
use crate::service::{describe_value, UserService};

/// Application state shared across all handlers.
///
/// `memory` is set only when the in-memory backend is active, so the
/// expiry sweep can be attached to it.
#[derive(Clone)]
pub struct AppState {
    pub cache: CacheClient,
    pub users: UserService,
    pub memory: Option<Arc<MemoryStore>>,
}

impl AppState {
    /// Creates a new AppState around the given client.
    pub fn new(cache: CacheClient) -> Self {
        Self {
            users: UserService::new(cache.clone()),
            cache,
            memory: None,
        }
    }

    /// Creates an AppState backed by a fresh in-memory store.
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        let mut state = Self::new(CacheClient::new(store.clone()));
        state.memory = Some(store);
        state
    }

    /// Creates a new AppState from configuration.
    ///
    /// Connects to Redis when that backend is selected.
    pub async fn from_config(config: &Config) -> Result<Self> {
        match config.backend {
            Backend::Redis => {
                info!("Connecting to Redis at {}", config.redis_url);
                let cache = CacheClient::connect(&config.redis_url).await?;
                Ok(Self::new(cache))
            }
            Backend::Memory => Ok(Self::in_memory()),
        }
    }
}

/// Handler for GET /user/:key
///
/// Returns a plain-text line describing the value stored at `key`.
pub async fn get_user_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<String> {
    let value = state.users.get_string(&key).await?;
    Ok(describe_value(&key, value.as_ref()))
}

/// Handler for PUT /user/:key
///
/// Stores the request value with a TTL unless the key is already set.
pub async fn put_user_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<SetValueRequest>,
) -> Result<Json<SetValueResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidArgument(error_msg));
    }

    let ttl = Duration::from_millis(req.ttl_ms());
    let stored = state.users.set_string(&key, &req.value, ttl).await?;

    Ok(Json(SetValueResponse::new(key, stored)))
}

/// Handler for GET /health
///
/// Reports whether the backing store answers a ping.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let up = match state.cache.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!("Health check: store unreachable: {}", e);
            false
        }
    };
    Json(HealthResponse::from_store(up))
}
