//! Control-plane port and HTTP client.

use async_trait::async_trait;

use junction_core::{Integration, IntegrationId, IntegrationType};

/// Error type for control-plane calls.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum ControlPlaneError {
    /// The integration does not exist on the control plane.
    #[error("integration `{0}` not found on control plane")]
    NotFound(IntegrationId),

    /// Transport-level failure — DNS, connect, timeout.
    #[error("control plane transport: {0}")]
    Transport(String),

    /// Unexpected HTTP status.
    #[error("control plane returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated for logging.
        body: String,
    },

    /// The response body did not decode as the expected shape.
    #[error("decode control-plane response: {0}")]
    Decode(String),
}

impl ControlPlaneError {
    /// Returns `true` if the call may succeed on retry: transport errors and
    /// server-side (5xx) statuses.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::NotFound(_) | Self::Decode(_) => false,
        }
    }
}

/// The external system of record for integration data.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Fetch the full integration graph: the integration plus all of its
    /// action configurations and the webhook configuration.
    async fn get_integration_details(
        &self,
        id: &IntegrationId,
    ) -> Result<Integration, ControlPlaneError>;

    /// Register this gateway's integration type at startup.
    async fn register_integration_type(
        &self,
        definition: &IntegrationType,
    ) -> Result<(), ControlPlaneError>;
}

const MAX_ERROR_BODY: usize = 512;

/// HTTP client for the control-plane API.
///
/// `GET <base>/integrations/<id>` and `POST <base>/integration-types`.
#[derive(Clone)]
pub struct HttpControlPlane {
    client: reqwest::Client,
    base_url: String,
}

impl HttpControlPlane {
    /// Create a client against `base_url` (no trailing slash required).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client reusing an existing `reqwest::Client` (connection
    /// pool included).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn error_body(response: reqwest::Response) -> String {
        let mut body = response.text().await.unwrap_or_default();
        body.truncate(MAX_ERROR_BODY);
        body
    }
}

#[async_trait]
impl ControlPlane for HttpControlPlane {
    async fn get_integration_details(
        &self,
        id: &IntegrationId,
    ) -> Result<Integration, ControlPlaneError> {
        let url = self.url(&format!("integrations/{id}"));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ControlPlaneError::Transport(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ControlPlaneError::NotFound(id.clone()));
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(ControlPlaneError::Status {
                status,
                body: Self::error_body(response).await,
            });
        }

        response
            .json::<Integration>()
            .await
            .map_err(|e| ControlPlaneError::Decode(e.to_string()))
    }

    async fn register_integration_type(
        &self,
        definition: &IntegrationType,
    ) -> Result<(), ControlPlaneError> {
        let url = self.url("integration-types");
        let response = self
            .client
            .post(&url)
            .json(definition)
            .send()
            .await
            .map_err(|e| ControlPlaneError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(ControlPlaneError::Status {
                status,
                body: Self::error_body(response).await,
            });
        }

        Ok(())
    }
}
