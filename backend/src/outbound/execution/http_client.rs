//! Reqwest-backed Piston execution adapter.
//!
//! This adapter owns transport details only: request serialisation, timeout
//! and HTTP error mapping, and JSON decoding into a run outcome.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use super::dto::{ExecuteRequestDto, ExecuteResponseDto};
use crate::domain::ports::{
    ExecutionBackend, ExecutionError, ExecutionOutcome, ExecutionRequest,
};

const DEFAULT_USER_AGENT: &str = "playground-backend-executor/0.1";

/// Public Piston instance used when the embedding application supplies no
/// endpoint of its own.
pub const DEFAULT_ENDPOINT: &str = "https://emkc.org/api/v2/piston/execute";

/// Request timeout applied by [`PistonHttpClient::from_defaults`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Execution adapter that POSTs submissions to one Piston-compatible endpoint.
pub struct PistonHttpClient {
    client: Client,
    endpoint: Url,
    user_agent: String,
}

impl PistonHttpClient {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        })
    }

    /// Build an adapter against the public Piston instance with the stock
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn from_defaults() -> Result<Self, reqwest::Error> {
        #[expect(clippy::expect_used, reason = "DEFAULT_ENDPOINT is a valid URL literal")]
        let endpoint = Url::parse(DEFAULT_ENDPOINT).expect("default endpoint parses");
        Self::new(endpoint, DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl ExecutionBackend for PistonHttpClient {
    async fn execute(
        &self,
        request: &ExecutionRequest,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::USER_AGENT, self.user_agent.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&ExecuteRequestDto::from_domain(request))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }

        let decoded: ExecuteResponseDto = serde_json::from_slice(body.as_ref())
            .map_err(|error| ExecutionError::decode(format!("invalid execute payload: {error}")))?;
        Ok(decoded.into_outcome())
    }
}

fn map_transport_error(error: reqwest::Error) -> ExecutionError {
    ExecutionError::transport(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> ExecutionError {
    ExecutionError::Status {
        status: status.as_u16(),
        body: body_preview(body),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
