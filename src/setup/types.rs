/// Data model shared by the configurator and the status controller.
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Error text for a transport failure during the probe.
pub const MSG_NETWORK_UNAVAILABLE: &str = "Network unavailable";

/// Fallback text when a rejected probe carries no message.
pub const MSG_VALIDATION_FAILED: &str = "Validation Failed";

/// Text for a 2xx probe without a usable chain tip.
pub const MSG_INVALID_KEY: &str = "Connection rejected by provider (Invalid Key)";

// ---------------------------------------------------------------------------
// ConnectionCandidate
// ---------------------------------------------------------------------------

/// Form-local endpoint/credential pair. Never persisted, only submitted.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectionCandidate {
    pub endpoint_url: String,
    pub credential_secret: String,
}

impl ConnectionCandidate {
    pub fn new(endpoint_url: impl Into<String>, credential_secret: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            credential_secret: credential_secret.into(),
        }
    }

    /// Whether the credential is empty or whitespace-only.
    pub fn credential_missing(&self) -> bool {
        self.credential_secret.trim().is_empty()
    }
}

impl fmt::Debug for ConnectionCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionCandidate")
            .field("endpoint_url", &self.endpoint_url)
            .field("credential_secret", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ValidationOutcome
// ---------------------------------------------------------------------------

/// Result of one probe attempt.
///
/// `is_valid` is only ever `true` together with a positive
/// `chain_tip_height`; the constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    is_valid: bool,
    chain_tip_height: Option<i64>,
    error_message: Option<String>,
}

impl ValidationOutcome {
    /// Interpret a chain tip reported by a successful probe.
    pub fn from_chain_tip(tip: Option<i64>) -> Self {
        match tip {
            Some(height) if height > 0 => Self {
                is_valid: true,
                chain_tip_height: Some(height),
                error_message: None,
            },
            _ => Self::rejected(MSG_INVALID_KEY),
        }
    }

    /// A failed probe with a human-readable reason.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            chain_tip_height: None,
            error_message: Some(message.into()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn chain_tip_height(&self) -> Option<i64> {
        self.chain_tip_height
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

// ---------------------------------------------------------------------------
// SetupStatus
// ---------------------------------------------------------------------------

/// Backend-held configuration state, as returned by `GET /setup/status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SetupStatus {
    #[serde(deserialize_with = "null_as_default")]
    pub is_configured: bool,
    pub active_network: Option<String>,
    pub active_endpoint: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub configured_networks: Vec<String>,
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// ---------------------------------------------------------------------------
// Switch request state
// ---------------------------------------------------------------------------

/// Request state of the single in-flight network switch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SwitchState {
    #[default]
    Idle,
    Pending {
        target: String,
    },
    Done {
        target: String,
        succeeded: bool,
    },
}

impl SwitchState {
    /// The target currently being switched to, if any.
    pub fn pending_target(&self) -> Option<&str> {
        match self {
            Self::Pending { target } => Some(target),
            _ => None,
        }
    }
}

/// What happened to a `switch_network` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// Backend accepted the switch; storage, broadcast and refetch ran.
    Switched,
    /// Another switch was in flight; no request was sent.
    Busy { pending: String },
    /// Backend or transport rejected the switch.
    Failed { reason: String },
}

impl SwitchOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Switched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_tip_is_valid() {
        let outcome = ValidationOutcome::from_chain_tip(Some(12345));
        assert!(outcome.is_valid());
        assert_eq!(outcome.chain_tip_height(), Some(12345));
        assert_eq!(outcome.error_message(), None);
    }

    #[test]
    fn missing_zero_or_negative_tip_is_invalid() {
        for tip in [None, Some(0), Some(-7)] {
            let outcome = ValidationOutcome::from_chain_tip(tip);
            assert!(!outcome.is_valid(), "tip {tip:?} should be rejected");
            assert_eq!(outcome.chain_tip_height(), None);
            assert_eq!(outcome.error_message(), Some(MSG_INVALID_KEY));
        }
    }

    #[test]
    fn setup_status_tolerates_missing_fields() {
        let status: SetupStatus = serde_json::from_str(r#"{"isConfigured": true}"#).unwrap();
        assert!(status.is_configured);
        assert!(status.active_network.is_none());
        assert!(status.configured_networks.is_empty());
    }

    #[test]
    fn setup_status_treats_null_as_empty() {
        let status: SetupStatus = serde_json::from_str(
            r#"{"isConfigured": null, "activeNetwork": null, "configuredNetworks": null}"#,
        )
        .unwrap();
        assert_eq!(status, SetupStatus::default());
    }

    #[test]
    fn setup_status_reads_camel_case() {
        let status: SetupStatus = serde_json::from_str(
            r#"{
                "isConfigured": true,
                "activeNetwork": "preprod",
                "activeEndpoint": "https://preprod.utxorpc.example",
                "configuredNetworks": ["mainnet", "preprod"]
            }"#,
        )
        .unwrap();
        assert_eq!(status.active_network.as_deref(), Some("preprod"));
        assert_eq!(status.configured_networks, vec!["mainnet", "preprod"]);
    }

    #[test]
    fn candidate_debug_hides_secret() {
        let candidate = ConnectionCandidate::new("https://x", "super-secret");
        let rendered = format!("{candidate:?}");
        assert!(!rendered.contains("super-secret"));
    }

    #[test]
    fn whitespace_credential_counts_as_missing() {
        assert!(ConnectionCandidate::new("https://x", "  \t").credential_missing());
        assert!(!ConnectionCandidate::new("https://x", "abc").credential_missing());
    }
}
