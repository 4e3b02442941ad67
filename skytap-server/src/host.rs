//! Host services derived from the trusted request headers set by the LMS.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use skytap_core::{CourseRef, Identity, Runtime};

/// Opaque per-learner id used to scope user state
pub const LEARNER_ID_HEADER: &str = "X-Learner-Id";
/// Email address of the learner, may be repeated or comma separated
pub const LEARNER_EMAIL_HEADER: &str = "X-Learner-Email";
/// Course key of the block usage
pub const COURSE_KEY_HEADER: &str = "X-Course-Key";

/// Learner id used when the host identified nobody
pub const ANONYMOUS_LEARNER: &str = "anonymous";

/// The host's view of the current request
#[derive(Debug, Clone)]
pub struct HostContext {
    learner_id: String,
    identity: Option<Identity>,
    course: Option<CourseRef>,
}

impl HostContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let emails = headers
            .get_all(LEARNER_EMAIL_HEADER)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .map(str::to_string)
            .collect::<Vec<_>>();
        let identity = Identity::from_emails(emails);

        let course = headers
            .get(COURSE_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(CourseRef::from_course_key);

        let learner_id = headers
            .get(LEARNER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .or_else(|| identity.as_ref().map(|identity| identity.email().to_string()))
            .unwrap_or_else(|| ANONYMOUS_LEARNER.to_string());

        Self {
            learner_id,
            identity,
            course,
        }
    }

    pub fn learner_id(&self) -> &str {
        &self.learner_id
    }
}

impl Runtime for HostContext {
    fn current_identity(&self) -> Option<Identity> {
        self.identity.clone()
    }

    fn current_course(&self) -> Option<CourseRef> {
        self.course.clone()
    }
}

impl<S> FromRequestParts<S> for HostContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
