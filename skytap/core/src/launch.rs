//! Launching an exercise environment for the current learner.

use std::sync::Arc;

use skytap_protocol::{BrokerRequest, BrokerResponse, LaunchResponse};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::broker::{BrokerClient, BrokerError};
use crate::config::resolve_broker_configuration;
use crate::context::Runtime;
use crate::error::{LaunchError, Result, UNDESCRIBED_BROKER_ERROR};
use crate::keyboard::UserState;
use crate::settings::SettingsStore;

/// Stages a launch attempt passes through. `Succeeded` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchStage {
    Init,
    GatheringContext,
    ValidatingConfig,
    Requesting,
    ClassifyingResponse,
    Succeeded,
    Failed,
}

impl std::fmt::Display for LaunchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LaunchStage::Init => "init",
            LaunchStage::GatheringContext => "gathering_context",
            LaunchStage::ValidatingConfig => "validating_config",
            LaunchStage::Requesting => "requesting",
            LaunchStage::ClassifyingResponse => "classifying_response",
            LaunchStage::Succeeded => "succeeded",
            LaunchStage::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// Orchestrates a single launch: context, configuration, one broker call, classification.
///
/// Settings are read on every launch so configuration changes apply without a restart.
#[derive(Clone)]
pub struct Launcher {
    settings: Arc<dyn SettingsStore>,
    broker: Arc<dyn BrokerClient>,
}

impl Launcher {
    pub fn new(settings: Arc<dyn SettingsStore>, broker: Arc<dyn BrokerClient>) -> Self {
        Self { settings, broker }
    }

    pub fn settings(&self) -> &dyn SettingsStore {
        self.settings.as_ref()
    }

    /// Launch an environment with `keyboard_layout` for the learner behind `runtime`.
    ///
    /// The layout is stored as the learner's preference before anything else is checked, so
    /// the choice survives a failed launch. Failures are reported before they are returned.
    #[instrument(
        name = "launch",
        skip_all,
        fields(launch_id = %Uuid::new_v4(), keyboard_layout = %keyboard_layout)
    )]
    pub async fn launch(
        &self,
        runtime: &dyn Runtime,
        user_state: &dyn UserState,
        keyboard_layout: &str,
    ) -> Result<LaunchResponse> {
        debug!(stage = %LaunchStage::Init);
        user_state.set_preferred_keyboard_layout(keyboard_layout);

        match self.try_launch(runtime, keyboard_layout).await {
            Ok(response) => {
                debug!(stage = %LaunchStage::Succeeded);
                info!("Skytap environment launched");
                Ok(response)
            }
            Err(e) => {
                debug!(stage = %LaunchStage::Failed);
                e.report();
                Err(e)
            }
        }
    }

    async fn try_launch(
        &self,
        runtime: &dyn Runtime,
        keyboard_layout: &str,
    ) -> Result<LaunchResponse> {
        debug!(stage = %LaunchStage::GatheringContext);
        let identity = runtime
            .current_identity()
            .ok_or(LaunchError::IdentityUnavailable)?;
        let course = runtime
            .current_course()
            .ok_or(LaunchError::CourseUnavailable)?;

        debug!(stage = %LaunchStage::ValidatingConfig);
        let configuration = resolve_broker_configuration(self.settings.as_ref())?;
        let url = configuration.boomi_url()?;

        debug!(
            stage = %LaunchStage::Requesting,
            course_name = %course.course,
            course_run = %course.run,
        );
        let request = BrokerRequest::new(
            identity.email().to_string(),
            keyboard_layout.to_string(),
            course.course,
            course.run,
        );
        let response = self.broker.create_vm(&url, &request).await?;

        debug!(stage = %LaunchStage::ClassifyingResponse);
        classify_response(response)
    }
}

/// Turn a parsed broker response into the launch outcome
pub fn classify_response(response: BrokerResponse) -> Result<LaunchResponse> {
    if response.error_exists {
        let message = response
            .error_message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| UNDESCRIBED_BROKER_ERROR.to_string());
        return Err(LaunchError::BrokerReportedError(message));
    }

    match response.skytap_url {
        Some(url) if !url.trim().is_empty() => Ok(LaunchResponse::new(url)),
        _ => Err(BrokerError::MissingSharingPortalUrl.into()),
    }
}
