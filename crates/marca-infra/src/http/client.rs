//! HttpTextBackend -- concrete [`TextBackend`] over HTTP.
//!
//! POSTs the [`GenerationRequest`] as JSON to the configured endpoint and
//! hands the raw response body back as a byte stream. Framing is not
//! interpreted here; marca-core decodes whatever arrives.
//!
//! The optional bearer token is wrapped in [`secrecy::SecretString`] and is
//! only exposed when building the request headers.

use std::time::Duration;

use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

use marca_core::backend::{ByteStream, TextBackend};
use marca_types::backend::{BackendError, GenerationRequest, error_message_from_body};
use marca_types::config::ClientConfig;

/// Text-generation backend reached over HTTP.
///
/// A missing endpoint is not an error at construction time; it surfaces as
/// [`BackendError::Configuration`] when a turn is actually sent.
pub struct HttpTextBackend {
    client: reqwest::Client,
    endpoint: Option<String>,
    token: Option<SecretString>,
}

impl HttpTextBackend {
    pub fn new(
        endpoint: Option<String>,
        token: Option<SecretString>,
        connect_timeout: Option<Duration>,
    ) -> Result<Self, BackendError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| BackendError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.filter(|url| !url.trim().is_empty()),
            token,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, BackendError> {
        Self::new(
            config.backend_url.clone(),
            config.backend_token.clone().map(SecretString::from),
            config.request_timeout_secs.map(Duration::from_secs),
        )
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    fn endpoint(&self) -> Result<&str, BackendError> {
        self.endpoint.as_deref().ok_or_else(|| {
            BackendError::Configuration(
                "backend_url is not set (config.toml or MARCA_BACKEND_URL)".to_string(),
            )
        })
    }
}

/// Map a non-success status and its body to an error.
pub(crate) fn status_error(status: u16, body: &str) -> BackendError {
    BackendError::Status {
        status,
        message: error_message_from_body(body),
    }
}

/// Success statuses that by definition carry no body to stream.
pub(crate) fn has_no_body(status: u16) -> bool {
    matches!(status, 204 | 205)
}

impl TextBackend for HttpTextBackend {
    #[tracing::instrument(
        name = "backend_send",
        skip_all,
        fields(conversation_id = %request.conversation_id, images = request.images.as_ref().map_or(0, Vec::len))
    )]
    async fn send(&self, request: &GenerationRequest) -> Result<ByteStream, BackendError> {
        let url = self.endpoint()?;

        let mut builder = self.client.post(url).json(request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token.expose_secret());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "backend error response");
            return Err(status_error(status.as_u16(), &body));
        }
        if has_no_body(status.as_u16()) {
            return Err(BackendError::StreamUnavailable);
        }

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| BackendError::Stream(e.to_string())));
        Ok(Box::pin(body))
    }
}
