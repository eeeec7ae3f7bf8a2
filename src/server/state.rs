use super::auth::TokenKeys;
use super::store::VisitorStore;
use crate::config::{ConfigError, PassConfig, ServerConfig};
use crate::metrics::MetricsRegistry;
use chrono::FixedOffset;
use std::sync::{Arc, Mutex, MutexGuard};

use super::error::ApiError;

/// Shared handler state.
pub struct AppState {
    store: Mutex<VisitorStore>,
    pub tokens: TokenKeys,
    pub metrics: MetricsRegistry,
    /// Local time zone for by-date queries.
    pub offset: FixedOffset,
}

impl AppState {
    pub fn new(
        store: VisitorStore,
        server: &ServerConfig,
        pass: &PassConfig,
        metrics: MetricsRegistry,
    ) -> Result<Arc<Self>, ConfigError> {
        server.validate()?;
        Ok(Arc::new(Self {
            store: Mutex::new(store),
            tokens: TokenKeys::new(&server.jwt_secret, server.token_ttl_hours),
            metrics,
            offset: pass.offset()?,
        }))
    }

    /// Locks the store. Never hold the guard across an `.await`.
    pub fn store(&self) -> Result<MutexGuard<'_, VisitorStore>, ApiError> {
        self.store
            .lock()
            .map_err(|_| ApiError::Internal("store lock poisoned".into()))
    }
}
