use tracing::error;

use crate::broker::BrokerError;
use crate::config::ConfigurationError;

pub type Result<T> = core::result::Result<T, LaunchError>;

/// Reasons a launch fails.
///
/// The `Display` text of each variant is the message shown to the learner. Details that are
/// meant for operators only live in the wrapped source and are logged by [`LaunchError::report`].
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("Unable to fetch the current user from the runtime.")]
    IdentityUnavailable,

    #[error("This block usage is not associated with a course.")]
    CourseUnavailable,

    #[error("The Skytap XBlock is improperly configured.")]
    MisconfiguredBroker(#[source] ConfigurationError),

    #[error("The Skytap launch service is currently unavailable.")]
    BrokerUnavailable(#[source] BrokerError),

    #[error("The Skytap launch service returned a malformed response.")]
    MalformedBrokerResponse(#[source] BrokerError),

    #[error("{0}")]
    BrokerReportedError(String),
}

/// Message forwarded when the broker flags an error without describing it
pub const UNDESCRIBED_BROKER_ERROR: &str = "The Skytap launch service reported an error.";

impl LaunchError {
    /// Message that is safe to show to the learner
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// Infrastructure failures are exceptional, expected outcomes and errors the broker
    /// handled itself are not
    pub fn is_exceptional(&self) -> bool {
        match self {
            LaunchError::IdentityUnavailable
            | LaunchError::CourseUnavailable
            | LaunchError::BrokerReportedError(_) => false,
            LaunchError::MisconfiguredBroker(_)
            | LaunchError::BrokerUnavailable(_)
            | LaunchError::MalformedBrokerResponse(_) => true,
        }
    }

    /// Log the failure. Exceptional failures carry their full source chain.
    pub fn report(&self) {
        if self.is_exceptional() {
            error!(error = ?self, cause = %source_chain(self), "{self}");
        } else {
            error!("{self}");
        }
    }
}

impl From<ConfigurationError> for LaunchError {
    fn from(error: ConfigurationError) -> Self {
        LaunchError::MisconfiguredBroker(error)
    }
}

impl From<BrokerError> for LaunchError {
    fn from(error: BrokerError) -> Self {
        match error {
            BrokerError::Transport(_) => LaunchError::BrokerUnavailable(error),
            BrokerError::Malformed { .. } | BrokerError::MissingSharingPortalUrl => {
                LaunchError::MalformedBrokerResponse(error)
            }
        }
    }
}

fn source_chain(error: &dyn std::error::Error) -> String {
    let mut causes = vec![];
    let mut current = error.source();
    while let Some(cause) = current {
        causes.push(cause.to_string());
        current = cause.source();
    }
    causes.join(": ")
}
