//! Client side of the backend `/setup/*` endpoints.
//!
//! [`SetupApi`] is the seam the controllers talk to. [`HttpSetupApi`] is the
//! production implementation; tests substitute a scripted fake.

mod http;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::setup::types::SetupStatus;

pub use http::HttpSetupApi;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Body of `POST /setup/validate-demeter` and `POST /setup/save-credentials`.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsPayload {
    pub grpc_endpoint: String,
    pub api_key: String,
    pub network: String,
}

impl fmt::Debug for CredentialsPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsPayload")
            .field("grpc_endpoint", &self.grpc_endpoint)
            .field("api_key", &"<redacted>")
            .field("network", &self.network)
            .finish()
    }
}

/// Body of `POST /setup/switch-network`.
#[derive(Debug, Serialize)]
pub(crate) struct SwitchPayload<'a> {
    pub network: &'a str,
}

/// Successful probe body. A missing or malformed body decodes to the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProbeBody {
    pub chain_tip_slot: Option<i64>,
}

/// Optional error fields a rejecting endpoint may send.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
}

impl ErrorBody {
    /// Server-provided message: `error` first, then `message`.
    pub fn server_message(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }
}

/// An HTTP exchange that completed at the transport level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply<T> {
    /// 2xx response with its decoded body.
    Accepted(T),
    /// Non-2xx response.
    Rejected { status: u16, body: ErrorBody },
}

/// Failures that never produced a usable HTTP reply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("failed to decode response: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Seam
// ---------------------------------------------------------------------------

/// Blocking access to the backend setup endpoints.
pub trait SetupApi: Send + Sync {
    /// `POST /setup/validate-demeter`
    fn validate_credentials(&self, payload: &CredentialsPayload)
    -> Result<Reply<ProbeBody>, ApiError>;

    /// `POST /setup/save-credentials`
    fn save_credentials(&self, payload: &CredentialsPayload) -> Result<Reply<()>, ApiError>;

    /// `GET /setup/status?_t=<ts>`; non-2xx is an error.
    fn fetch_status(&self) -> Result<SetupStatus, ApiError>;

    /// `POST /setup/switch-network`
    fn switch_network(&self, network: &str) -> Result<Reply<()>, ApiError>;

    /// `DELETE /setup/clear-credentials`
    fn clear_credentials(&self) -> Result<Reply<()>, ApiError>;
}
