/// Configuration schema and defaults for the panoptes client.
///
/// Defines the TOML-serializable configuration structure with the sections
/// `[backend]`, `[storage]`, and `[journal]`.
///
/// Every field has a built-in default. Users only need to set the values
/// they want to override.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default backend origin used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Default request timeout for setup calls.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level panoptes configuration.
///
/// Maps to `~/.panoptes/config.toml` and `.panoptes.toml`. Missing sections
/// and fields fall back to built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanoptesConfig {
    pub backend: BackendConfig,
    pub storage: StorageConfig,
    pub journal: JournalConfig,
}

// ---------------------------------------------------------------------------
// [backend]
// ---------------------------------------------------------------------------

/// Where the setup endpoints live and how long to wait for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Origin the `/setup/*` paths are resolved against.
    /// Overridden by `PANOPTES_API_URL`.
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

// ---------------------------------------------------------------------------
// [storage]
// ---------------------------------------------------------------------------

/// Location of the durable client-side state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding `local-storage.json` and the setup journal.
    /// Empty means `~/.panoptes`.
    pub dir: String,
}

impl StorageConfig {
    /// Resolve the storage directory, falling back to `~/.panoptes`.
    pub fn resolve_dir(&self) -> Option<PathBuf> {
        if self.dir.trim().is_empty() {
            dirs::home_dir().map(|home| home.join(".panoptes"))
        } else {
            Some(PathBuf::from(&self.dir))
        }
    }
}

// ---------------------------------------------------------------------------
// [journal]
// ---------------------------------------------------------------------------

/// Setup-operation journal settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    /// Append one JSONL entry per setup operation.
    pub enabled: bool,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl PanoptesConfig {
    /// Annotated default config written by `panoptes config init`.
    pub fn default_toml() -> String {
        format!(
            r#"# panoptes client configuration
#
# Precedence: built-in defaults < ~/.panoptes/config.toml < .panoptes.toml < PANOPTES_* env vars

[backend]
# Origin serving the /setup/* endpoints (PANOPTES_API_URL)
base_url = "{DEFAULT_BASE_URL}"
# Request timeout in milliseconds (PANOPTES_TIMEOUT_MS)
timeout_ms = {DEFAULT_TIMEOUT_MS}

[storage]
# Directory for local-storage.json and setup-log.jsonl; empty = ~/.panoptes (PANOPTES_HOME)
dir = ""

[journal]
# Record every setup operation to setup-log.jsonl (PANOPTES_JOURNAL)
enabled = true
"#
        )
    }
}
