//! Report fetching over HTTP.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Path of the report-by-id endpoint, relative to the service base URL.
pub const ASSESS_BY_ID_PATH: &str = "/assess/id";

/// Client errors.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("No rapport for patient {0}")]
    NotFound(i64),

    #[error("Unexpected HTTP status: {0}")]
    Status(u16),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response body: {0}")]
    Decode(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Report as returned by the rapport service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RapportResponse {
    pub last_name: String,
    pub first_name: String,
    /// One-letter code, `M` or `F`
    pub sex: String,
    pub age: u32,
    /// `None`, `Borderline`, `InDanger` or `EarlyOnset`
    pub assessment: String,
}

/// Blocking client, one request per call, no retry.
#[derive(Clone)]
pub struct RapportHttpClient {
    agent: ureq::Agent,
    base_url: String,
}

impl RapportHttpClient {
    /// Create a client for the service at `base_url` (e.g. `http://localhost:8080`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { agent, base_url }
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of the report endpoint, without query string.
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, ASSESS_BY_ID_PATH)
    }

    /// Fetch the report for one patient.
    pub fn fetch(&self, id: i64) -> ClientResult<RapportResponse> {
        let url = self.endpoint();
        tracing::debug!(%url, id, "requesting rapport");

        let response = self
            .agent
            .get(&url)
            .query("id", &id.to_string())
            .call()
            .map_err(|e| classify_error(e, id))?;

        response
            .into_json::<RapportResponse>()
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

fn classify_error(err: ureq::Error, id: i64) -> ClientError {
    match err {
        ureq::Error::Status(404, _) => ClientError::NotFound(id),
        ureq::Error::Status(code, _) => ClientError::Status(code),
        ureq::Error::Transport(transport) => ClientError::Transport(transport.to_string()),
    }
}
