use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use skytap_protocol::{LaunchPayload, LaunchResponse};
use tracing::warn;

use crate::{error::ApiError, host::HostContext, ApiContextRef};

/// Launch an environment for the learner of the request
pub async fn launch(
    State(context): State<ApiContextRef>,
    host: HostContext,
    payload: Result<Json<LaunchPayload>, JsonRejection>,
) -> Result<Json<LaunchResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        warn!(error = %rejection, "Rejected launch payload");
        ApiError::InvalidPayload(rejection.body_text())
    })?;

    let user_state = context.preferences.for_learner(host.learner_id());
    let response = context
        .launcher
        .launch(&host, &user_state, payload.keyboard_layout())
        .await?;

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{
        block_settings, context, extract_json_body, request, success, SHARING_PORTAL_URL,
    };
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use skytap_core::{BrokerError, UserState};
    use skytap_protocol::{BrokerRequest, BrokerResponse};
    use tower::ServiceExt;

    fn handled_error() -> Result<BrokerResponse, BrokerError> {
        Ok(BrokerResponse {
            error_exists: true,
            error_message: Some("A handled error.".to_string()),
            skytap_url: None,
        })
    }

    fn malformed() -> Result<BrokerResponse, BrokerError> {
        let body = "Certainly this response is not valid. It's not even valid JSON.";
        let source = serde_json::from_str::<BrokerResponse>(body).unwrap_err();
        Err(BrokerError::malformed(200, body, source))
    }

    fn unreachable() -> Result<BrokerResponse, BrokerError> {
        Err(BrokerError::Transport("connection refused".into()))
    }

    fn launch_request(body: &str) -> Request<Body> {
        request(Method::POST, "/handler/launch")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn assert_launch_response(
        settings: Value,
        reply: crate::api::test_support::Reply,
        request: Request<Body>,
        expected: Value,
        code: StatusCode,
    ) {
        let (context, _) = context(settings, reply);
        let app = crate::app(context);

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), code);
        assert_eq!(extract_json_body(response).await, expected);
    }

    #[tokio::test]
    async fn test_launch() {
        let (context, broker) = context(block_settings(), success);
        let app = crate::app(context.clone());

        let response = app.oneshot(launch_request(r#""de""#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            extract_json_body(response).await,
            json!({ "sharing_portal_url": SHARING_PORTAL_URL })
        );
        assert_eq!(
            *broker.calls.lock().unwrap(),
            vec![BrokerRequest::new(
                "testuser@example.com".into(),
                "de".into(),
                "TestCourse".into(),
                "201704".into(),
            )]
        );
        assert_eq!(
            context
                .preferences
                .for_learner("student-1")
                .preferred_keyboard_layout(),
            "de"
        );
    }

    #[tokio::test]
    async fn test_launch_object_payload() {
        assert_launch_response(
            block_settings(),
            success,
            launch_request(r#"{"keyboard_layout": "fr"}"#),
            json!({ "sharing_portal_url": SHARING_PORTAL_URL }),
            StatusCode::OK,
        )
        .await;
    }

    #[tokio::test]
    async fn test_launch_handled_error() {
        assert_launch_response(
            block_settings(),
            handled_error,
            launch_request(r#""de""#),
            json!({ "error": "A handled error." }),
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .await;
    }

    #[tokio::test]
    async fn test_launch_malformed_response() {
        assert_launch_response(
            block_settings(),
            malformed,
            launch_request(r#""de""#),
            json!({ "error": "The Skytap launch service returned a malformed response." }),
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .await;
    }

    #[tokio::test]
    async fn test_launch_broker_unavailable() {
        assert_launch_response(
            block_settings(),
            unreachable,
            launch_request(r#""de""#),
            json!({ "error": "The Skytap launch service is currently unavailable." }),
            StatusCode::SERVICE_UNAVAILABLE,
        )
        .await;
    }

    #[tokio::test]
    async fn test_launch_improperly_configured() {
        assert_launch_response(
            json!({}),
            success,
            launch_request(r#""de""#),
            json!({ "error": "The Skytap XBlock is improperly configured." }),
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .await;
    }

    #[tokio::test]
    async fn test_launch_no_runtime_user() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/handler/launch")
            .header("X-API-Key", crate::api::test_support::API_KEY)
            .header("X-Course-Key", "course-v1:OpenCraft+TestCourse+201704")
            .header("Content-Type", "application/json")
            .body(Body::from(r#""de""#))
            .unwrap();

        assert_launch_response(
            block_settings(),
            success,
            request,
            json!({ "error": "Unable to fetch the current user from the runtime." }),
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .await;
    }

    #[tokio::test]
    async fn test_launch_no_runtime_course() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/handler/launch")
            .header("X-API-Key", crate::api::test_support::API_KEY)
            .header("X-Learner-Email", "testuser@example.com")
            .header("Content-Type", "application/json")
            .body(Body::from(r#""de""#))
            .unwrap();

        assert_launch_response(
            block_settings(),
            success,
            request,
            json!({ "error": "This block usage is not associated with a course." }),
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .await;
    }

    #[tokio::test]
    async fn test_launch_invalid_payload() {
        let (context, broker) = context(block_settings(), success);
        let app = crate::app(context.clone());

        let response = app
            .oneshot(launch_request(r#"{"layout": "de"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = extract_json_body(response).await;
        assert!(body["error"].is_string());
        assert!(broker.calls.lock().unwrap().is_empty());
        assert_eq!(
            context
                .preferences
                .for_learner("student-1")
                .preferred_keyboard_layout(),
            "us"
        );
    }
}
