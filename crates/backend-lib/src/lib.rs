// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core backend-lib functionality for the Folio auth server.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod router;
pub mod storage;
pub mod validation;

use std::sync::Arc;

use crate::auth::AuthService;
use crate::config::Settings;
use crate::error::AppError;
use crate::storage::{FlatFileStorage, UserStore};

/// Application state shared across all handlers
pub struct AppState<S> {
    /// Authentication service, owning the user store
    pub auth: Arc<AuthService<S>>,
    /// Settings the server was started with
    pub settings: Arc<Settings>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            auth: Arc::clone(&self.auth),
            settings: Arc::clone(&self.settings),
        }
    }
}

impl<S: UserStore> AppState<S> {
    /// Create a new application state around an explicit store handle
    pub fn new(storage: S, config: &Settings) -> Result<Self, AppError> {
        config.validate()?;
        let auth = Arc::new(AuthService::new(storage, config)?);
        Ok(Self {
            auth,
            settings: Arc::new(config.clone()),
        })
    }
}

impl AppState<FlatFileStorage> {
    /// Create a state backed by flat files in `config.data_dir`
    pub fn from_settings(config: &Settings) -> anyhow::Result<Self> {
        let storage = FlatFileStorage::new(&config.data_dir)?;
        Ok(Self::new(storage, config)?)
    }
}
