use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

const JOURNAL_FILE: &str = "setup-log.jsonl";

// ---------------------------------------------------------------------------
// Journal entry (JSONL)
// ---------------------------------------------------------------------------

/// Setup operations recorded in the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Validate,
    Save,
    FetchStatus,
    SwitchNetwork,
    ClearCredentials,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Validate => "validate",
            Self::Save => "save",
            Self::FetchStatus => "fetch_status",
            Self::SwitchNetwork => "switch_network",
            Self::ClearCredentials => "clear_credentials",
        };
        f.write_str(name)
    }
}

/// A single entry in `<storage dir>/setup-log.jsonl`.
///
/// Credentials are never written; `detail` carries outcome text only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub timestamp: String,
    pub operation: Operation,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub network: Option<String>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detail: Option<String>,
}

impl JournalEntry {
    pub fn new(operation: Operation, success: bool) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            operation,
            network: None,
            success,
            latency_ms: None,
            detail: None,
        }
    }

    pub fn network(mut self, network: impl Into<String>) -> Self {
        self.network = Some(network.into());
        self
    }

    pub fn latency_ms(mut self, ms: u64) -> Self {
        self.latency_ms = Some(ms);
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Journal
// ---------------------------------------------------------------------------

/// Append-only JSONL record of setup operations. All writes are best-effort.
#[derive(Debug, Clone)]
pub struct Journal {
    path: Option<PathBuf>,
}

impl Journal {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: Some(dir.join(JOURNAL_FILE)),
        }
    }

    /// A journal that records nothing.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn record(&self, entry: JournalEntry) {
        let _ = self.append(&entry);
    }

    /// Read all entries, skipping malformed lines.
    pub fn read_all(&self) -> Vec<JournalEntry> {
        let Some(path) = &self.path else {
            return Vec::new();
        };

        let Ok(file) = fs::File::open(path) else {
            return Vec::new();
        };

        BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| serde_json::from_str::<JournalEntry>(&line).ok())
            .collect()
    }

    /// Entries from the last `days` days, or all of them for `None`.
    pub fn read_since_days(&self, days: Option<u32>) -> Vec<JournalEntry> {
        let entries = self.read_all();

        let Some(days) = days else {
            return entries;
        };

        let cutoff = (Utc::now() - chrono::Duration::days(i64::from(days))).to_rfc3339();

        entries
            .into_iter()
            .filter(|e| e.timestamp >= cutoff)
            .collect()
    }

    fn append(&self, entry: &JournalEntry) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let json = serde_json::to_string(entry)?;
        writeln!(file, "{json}")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_journal(name: &str) -> (Journal, PathBuf) {
        let dir = std::env::temp_dir().join(format!(
            "panoptes-journal-{name}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        (Journal::in_dir(&dir), dir)
    }

    #[test]
    fn records_and_reads_back() {
        let (journal, dir) = scratch_journal("roundtrip");
        journal.record(
            JournalEntry::new(Operation::SwitchNetwork, true)
                .network("preprod")
                .latency_ms(12),
        );
        journal.record(JournalEntry::new(Operation::Save, false).detail("HTTP 500"));

        let entries = journal.read_all();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].operation, Operation::SwitchNetwork);
        assert_eq!(entries[0].network.as_deref(), Some("preprod"));
        assert!(!entries[1].success);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn skips_malformed_lines() {
        let (journal, dir) = scratch_journal("malformed");
        journal.record(JournalEntry::new(Operation::Validate, true));
        let mut file = OpenOptions::new()
            .append(true)
            .open(journal.path().unwrap())
            .unwrap();
        writeln!(file, "garbage").unwrap();

        assert_eq!(journal.read_all().len(), 1);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn day_filter_drops_old_entries() {
        let (journal, dir) = scratch_journal("days");
        let mut old = JournalEntry::new(Operation::FetchStatus, true);
        old.timestamp = (Utc::now() - chrono::Duration::days(10)).to_rfc3339();
        journal.record(old);
        journal.record(JournalEntry::new(Operation::FetchStatus, true));

        assert_eq!(journal.read_since_days(Some(3)).len(), 1);
        assert_eq!(journal.read_since_days(None).len(), 2);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn disabled_journal_records_nothing() {
        let journal = Journal::disabled();
        journal.record(JournalEntry::new(Operation::Save, true));
        assert!(journal.read_all().is_empty());
    }

    #[test]
    fn entry_serialization_omits_empty_fields() {
        let json = serde_json::to_string(&JournalEntry::new(Operation::ClearCredentials, true))
            .unwrap();
        assert!(json.contains("\"operation\":\"clear_credentials\""));
        assert!(!json.contains("network"));
        assert!(!json.contains("latency_ms"));
    }
}
