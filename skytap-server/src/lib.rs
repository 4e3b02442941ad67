//! # Skytap Server
//!
//! HTTP host for the Skytap launcher block. The LMS proxies block requests to this service and
//! passes the learner and course of each request in trusted headers (see [`host`]), authenticated
//! with a shared API key.
//!
//! ## Routes
//!
//! - `GET /api/health`: liveness, no authentication
//! - `GET /view`: data needed to render the launch controls
//! - `POST /handler/launch`: launch an environment with the posted keyboard layout
//!
//! Block settings are read from a settings file on every request, so edits take effect without
//! a restart.

use std::sync::Arc;

use axum::Router;
use skytap_core::{Launcher, PreferenceStore};

pub mod api;
pub mod config;
pub mod error;
pub mod host;

pub use config::Config;

pub type ApiContextRef = Arc<ApiContext>;

pub struct ApiContext {
    pub config: Config,
    pub launcher: Launcher,
    pub preferences: Arc<PreferenceStore>,
}

impl ApiContext {
    pub fn new(config: Config, launcher: Launcher) -> Self {
        Self {
            config,
            launcher,
            preferences: Arc::new(PreferenceStore::new()),
        }
    }
}

/// Application router with all routes and state attached
pub fn app(context: ApiContextRef) -> Router {
    Router::new()
        .merge(api::router(Arc::clone(&context)))
        .with_state(context)
}
