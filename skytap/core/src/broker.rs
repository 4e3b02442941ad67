//! Client for the broker's `createVm` endpoint.

use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT};
use skytap_protocol::{BrokerRequest, BrokerResponse};
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("Failed to reach the broker")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error(
        "Broker returned a body that is not a valid createVm response (HTTP {status}, {bytes} bytes): {body}"
    )]
    Malformed {
        status: u16,
        bytes: usize,
        /// At most [`MALFORMED_BODY_PREVIEW`] bytes of the body
        body: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Broker reported success without a sharing portal URL")]
    MissingSharingPortalUrl,
}

/// Bytes of a malformed body kept for the logs
pub const MALFORMED_BODY_PREVIEW: usize = 2048;

impl BrokerError {
    /// The request URL carries the broker credential and is stripped from transport errors.
    pub fn transport(error: reqwest::Error) -> Self {
        BrokerError::Transport(Box::new(error.without_url()))
    }

    pub fn malformed(status: u16, body: &str, source: serde_json::Error) -> Self {
        let mut end = body.len().min(MALFORMED_BODY_PREVIEW);
        while !body.is_char_boundary(end) {
            end -= 1;
        }

        BrokerError::Malformed {
            status,
            bytes: body.len(),
            body: body[..end].to_string(),
            source,
        }
    }
}

/// Transport used to reach the broker.
///
/// Exactly one request is made per call; there are no retries.
#[async_trait]
pub trait BrokerClient: Send + Sync {
    async fn create_vm(
        &self,
        url: &str,
        request: &BrokerRequest,
    ) -> Result<BrokerResponse, BrokerError>;
}

/// [`BrokerClient`] over HTTP with the transport's default timeouts
#[derive(Debug, Clone, Default)]
pub struct HttpBrokerClient {
    client: reqwest::Client,
}

impl HttpBrokerClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BrokerClient for HttpBrokerClient {
    async fn create_vm(
        &self,
        url: &str,
        request: &BrokerRequest,
    ) -> Result<BrokerResponse, BrokerError> {
        let response = self
            .client
            .post(url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .json(request)
            .send()
            .await
            .map_err(BrokerError::transport)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(BrokerError::transport)?;

        if !status.is_success() {
            warn!(status = %status, "Broker responded with a non-success status");
        }
        debug!(status = %status, bytes = body.len(), "Received broker response");

        serde_json::from_str::<BrokerResponse>(&body)
            .map_err(|source| BrokerError::malformed(status.as_u16(), &body, source))
    }
}
