/// `ureq`-backed implementation of [`SetupApi`].
///
/// Every call is a single blocking request with the configured timeout.
/// `ureq` reports 4xx/5xx as `Error::Status`, which we turn into
/// [`Reply::Rejected`]; only `Error::Transport` becomes [`ApiError::Transport`].
use std::time::Duration;

use chrono::Utc;
use serde::de::DeserializeOwned;

use super::{ApiError, CredentialsPayload, ErrorBody, ProbeBody, Reply, SetupApi, SwitchPayload};
use crate::config::schema::BackendConfig;
use crate::setup::types::SetupStatus;

/// Synchronous HTTP client for the setup endpoints.
#[derive(Debug, Clone)]
pub struct HttpSetupApi {
    base_url: String,
    timeout: Duration,
}

impl HttpSetupApi {
    /// Build a client from the resolved backend config.
    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(&config.base_url, Duration::from_millis(config.timeout_ms))
    }

    pub fn new(base_url: &str, timeout: Duration) -> Self {
        // "localhost" may resolve to ::1 first and stall when the backend
        // only binds IPv4.
        let base_url = rewrite_localhost(base_url.trim_end_matches('/'));
        Self { base_url, timeout }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Status URL with a cache-busting timestamp.
    fn status_url(&self) -> String {
        format!(
            "{}?_t={}",
            self.url("/setup/status"),
            Utc::now().timestamp_millis()
        )
    }
}

/// Replace the host with `127.0.0.1` only when it is exactly `localhost`.
fn rewrite_localhost(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let host_end = rest.find([':', '/', '?', '#']).unwrap_or(rest.len());
    if rest[..host_end].eq_ignore_ascii_case("localhost") {
        format!("{scheme}://127.0.0.1{}", &rest[host_end..])
    } else {
        url.to_string()
    }
}

impl SetupApi for HttpSetupApi {
    fn validate_credentials(
        &self,
        payload: &CredentialsPayload,
    ) -> Result<Reply<ProbeBody>, ApiError> {
        let result = ureq::post(&self.url("/setup/validate-demeter"))
            .timeout(self.timeout)
            .send_json(payload);
        into_reply(result)
    }

    fn save_credentials(&self, payload: &CredentialsPayload) -> Result<Reply<()>, ApiError> {
        let result = ureq::post(&self.url("/setup/save-credentials"))
            .timeout(self.timeout)
            .send_json(payload);
        into_reply(result)
    }

    fn fetch_status(&self) -> Result<SetupStatus, ApiError> {
        let result = ureq::get(&self.status_url())
            .timeout(self.timeout)
            .set("Cache-Control", "no-cache")
            .call();

        match result {
            Ok(resp) => resp
                .into_json::<SetupStatus>()
                .map_err(|e| ApiError::Decode(e.to_string())),
            Err(ureq::Error::Status(code, _)) => Err(ApiError::Status(code)),
            Err(ureq::Error::Transport(t)) => Err(ApiError::Transport(t.to_string())),
        }
    }

    fn switch_network(&self, network: &str) -> Result<Reply<()>, ApiError> {
        let result = ureq::post(&self.url("/setup/switch-network"))
            .timeout(self.timeout)
            .send_json(SwitchPayload { network });
        into_reply(result)
    }

    fn clear_credentials(&self) -> Result<Reply<()>, ApiError> {
        let result = ureq::delete(&self.url("/setup/clear-credentials"))
            .timeout(self.timeout)
            .call();
        into_reply(result)
    }
}

/// Classify a `ureq` result. Bodies that fail to decode fall back to defaults.
fn into_reply<T: DeserializeOwned + Default>(
    result: Result<ureq::Response, ureq::Error>,
) -> Result<Reply<T>, ApiError> {
    match result {
        Ok(resp) => Ok(Reply::Accepted(resp.into_json::<T>().unwrap_or_default())),
        Err(ureq::Error::Status(status, resp)) => Ok(Reply::Rejected {
            status,
            body: resp.into_json::<ErrorBody>().unwrap_or_default(),
        }),
        Err(ureq::Error::Transport(t)) => Err(ApiError::Transport(t.to_string())),
    }
}
