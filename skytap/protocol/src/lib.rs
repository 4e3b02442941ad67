//! Wire protocol for the Skytap launcher
//!
//! This crate defines the JSON bodies that cross the two network boundaries of the launcher:
//!
//! - Outbound: the `createVm` request sent to the Boomi broker and the response it returns
//! - Inbound: the launch payload posted by the course page and the response bodies sent back
//!
//! The broker is loose about the type of its `ErrorExists` flag, so the tolerant parsing
//! happens here and the rest of the workspace only ever sees a `bool`.

use serde::{Deserialize, Serialize};

mod serde_helpers;

pub use serde_helpers::deserialize_flag;

/// Body of the POST request sent to the broker's `createVm` endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_new::new)]
pub struct BrokerRequest {
    /// Email address of the learner the environment is provisioned for
    pub email: String,
    /// Keyboard layout code the environment should be configured with
    pub keyboard_layout: String,
    /// Short name of the course the block is embedded in
    pub course_name: String,
    /// Run identifier of the course
    pub course_run: String,
}

/// Body returned by the broker's `createVm` endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerResponse {
    /// Whether the broker handled the request but reported an error.
    /// Accepts a JSON boolean or the strings `"true"`/`"false"` in any case.
    #[serde(rename = "ErrorExists", default, deserialize_with = "deserialize_flag")]
    pub error_exists: bool,

    /// Human-readable error reported by the broker
    #[serde(rename = "ErrorMessage", default)]
    pub error_message: Option<String>,

    /// Sharing portal URL of the provisioned environment
    #[serde(rename = "SkytapURL", default)]
    pub skytap_url: Option<String>,
}

/// Payload posted by the course page to launch an environment.
///
/// Both a bare JSON string and an object with a `keyboard_layout` field are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LaunchPayload {
    Bare(String),
    Object { keyboard_layout: String },
}

impl LaunchPayload {
    /// The requested keyboard layout code
    pub fn keyboard_layout(&self) -> &str {
        match self {
            LaunchPayload::Bare(layout) => layout,
            LaunchPayload::Object { keyboard_layout } => keyboard_layout,
        }
    }
}

/// Successful launch response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_new::new)]
pub struct LaunchResponse {
    pub sharing_portal_url: String,
}

/// Failed launch response, and the error body of every other route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_new::new)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_broker_request_wire_names() {
        let request = BrokerRequest::new(
            "learner@example.com".to_string(),
            "de".to_string(),
            "TestCourse".to_string(),
            "201704".to_string(),
        );

        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "email": "learner@example.com",
                "keyboard_layout": "de",
                "course_name": "TestCourse",
                "course_run": "201704",
            })
        );
    }

    #[test]
    fn test_broker_success_response() {
        let body = r#"{
            "ErrorExists": false,
            "ErrorMessage": null,
            "SkytapURL": "https://skytap.example.com/sharing/portal/url"
        }"#;

        let response: BrokerResponse = serde_json::from_str(body).unwrap();

        assert!(!response.error_exists);
        assert_eq!(response.error_message, None);
        assert_eq!(
            response.skytap_url.as_deref(),
            Some("https://skytap.example.com/sharing/portal/url")
        );
    }

    #[rstest]
    #[case::bool_true(r#"true"#, true)]
    #[case::bool_false(r#"false"#, false)]
    #[case::string_true(r#""true""#, true)]
    #[case::string_false(r#""false""#, false)]
    #[case::string_mixed_case(r#""True""#, true)]
    #[case::string_upper_case(r#""FALSE""#, false)]
    #[case::null(r#"null"#, false)]
    fn test_error_exists_flag_shapes(#[case] flag: &str, #[case] expected: bool) {
        let body = format!(r#"{{"ErrorExists": {flag}, "ErrorMessage": "X"}}"#);

        let response: BrokerResponse = serde_json::from_str(&body).unwrap();

        assert_eq!(response.error_exists, expected);
    }

    #[test]
    fn test_error_exists_missing_defaults_to_false() {
        let response: BrokerResponse =
            serde_json::from_str(r#"{"SkytapURL": "https://skytap.example.com"}"#).unwrap();

        assert!(!response.error_exists);
    }

    #[rstest]
    #[case::unknown_word(r#""yes""#)]
    #[case::number(r#"1"#)]
    #[case::object(r#"{}"#)]
    fn test_error_exists_rejects_other_values(#[case] flag: &str) {
        let body = format!(r#"{{"ErrorExists": {flag}}}"#);

        assert!(serde_json::from_str::<BrokerResponse>(&body).is_err());
    }

    #[test]
    fn test_non_object_broker_body_is_rejected() {
        assert!(serde_json::from_str::<BrokerResponse>(r#"["ErrorExists"]"#).is_err());
        assert!(serde_json::from_str::<BrokerResponse>("It's not even valid JSON.").is_err());
    }

    #[rstest]
    #[case::bare(r#""de""#)]
    #[case::object(r#"{"keyboard_layout": "de"}"#)]
    fn test_launch_payload_shapes(#[case] body: &str) {
        let payload: LaunchPayload = serde_json::from_str(body).unwrap();

        assert_eq!(payload.keyboard_layout(), "de");
    }

    #[test]
    fn test_launch_payload_requires_layout() {
        assert!(serde_json::from_str::<LaunchPayload>(r#"{"layout": "de"}"#).is_err());
        assert!(serde_json::from_str::<LaunchPayload>("42").is_err());
    }
}
