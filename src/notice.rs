//! Transient user-visible notices.
//!
//! Controllers never print directly; they hand a [`Notice`] to whatever
//! [`Notify`] sink they were built with. The CLI uses [`ConsoleNotifier`];
//! tests and embedders use [`MemoryNotifier`].

use std::fmt;
use std::sync::Mutex;

use colored::Colorize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Sink for notices.
pub trait Notify: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Prints notices to stderr, colored by level.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notify for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        let line = match notice.level {
            NoticeLevel::Success => format!("✓ {}", notice.message).green(),
            NoticeLevel::Info => format!("• {}", notice.message).cyan(),
            NoticeLevel::Warning => format!("! {}", notice.message).yellow(),
            NoticeLevel::Error => format!("✗ {}", notice.message).red(),
        };
        eprintln!("{line}");
    }
}

/// Records notices in memory.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }

    /// Messages of the given level, oldest first.
    pub fn messages(&self, level: NoticeLevel) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter(|n| n.level == level)
            .map(|n| n.message)
            .collect()
    }
}

impl Notify for MemoryNotifier {
    fn notify(&self, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}
