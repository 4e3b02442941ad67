//! # Skytap Core
//!
//! Launch remote Skytap exercise environments for learners through a Boomi integration broker.
//!
//! A launch gathers the learner's identity and course from the host [`Runtime`], resolves the
//! broker connection from the host [`SettingsStore`], issues a single `createVm` call through a
//! [`BrokerClient`] and classifies the response into a sharing portal URL or a [`LaunchError`]
//! whose message is safe to show to the learner.
//!
//! ```no_run
//! use std::sync::Arc;
//! use skytap_core::prelude::*;
//!
//! # async fn run() {
//! let settings = Arc::new(StaticSettings::unavailable());
//! let launcher = Launcher::new(settings, Arc::new(HttpBrokerClient::default()));
//! let preferences = Arc::new(PreferenceStore::new());
//!
//! let runtime = StaticRuntime::default();
//! let result = launcher
//!     .launch(&runtime, &preferences.for_learner("learner"), "de")
//!     .await;
//! assert!(result.is_err());
//! # }
//! ```

pub mod broker;
pub mod config;
pub mod context;
pub mod error;
pub mod keyboard;
pub mod launch;
pub mod settings;

pub use broker::{BrokerClient, BrokerError, HttpBrokerClient};
pub use config::{
    get_boomi_url, resolve_broker_configuration, BrokerConfiguration, ConfigurationError,
};
pub use context::{CourseRef, Identity, Runtime, StaticRuntime};
pub use error::{LaunchError, Result};
pub use keyboard::{
    get_keyboard_layouts, sorted_keyboard_layouts, KeyboardLayouts, LearnerState,
    PreferenceStore, UserState,
};
pub use launch::{classify_response, LaunchStage, Launcher};
pub use settings::{FileSettings, SettingsError, SettingsFormat, SettingsStore, StaticSettings};

/// Prelude to import the types needed to embed the launcher
pub mod prelude {
    pub use super::broker::{BrokerClient, HttpBrokerClient};
    pub use super::context::{CourseRef, Identity, Runtime, StaticRuntime};
    pub use super::error::LaunchError;
    pub use super::keyboard::{PreferenceStore, UserState};
    pub use super::launch::Launcher;
    pub use super::settings::{FileSettings, SettingsStore, StaticSettings};

    pub use skytap_protocol::{LaunchPayload, LaunchResponse};
}
