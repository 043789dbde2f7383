//! Process-wide "configuration changed" signal.
//!
//! A [`ConfigBus`] is created once and shared (`Arc`) with every component
//! that publishes or listens. Each subscriber gets its own
//! `mpsc::Receiver`; a dropped receiver is pruned on the next publish.

use std::sync::{Mutex, MutexGuard};
use std::sync::mpsc::{self, Receiver, Sender};

/// Wire name of the configuration-changed event.
pub const NETWORK_CONFIG_UPDATED: &str = "network_config_updated";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigEvent {
    /// Backend setup state changed; listeners should refetch their own view.
    NetworkConfigUpdated,
}

impl ConfigEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NetworkConfigUpdated => NETWORK_CONFIG_UPDATED,
        }
    }
}

#[derive(Debug, Default)]
pub struct ConfigBus {
    subscribers: Mutex<Vec<Sender<ConfigEvent>>>,
}

impl ConfigBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<ConfigEvent> {
        let (tx, rx) = mpsc::channel();
        lock(&self.subscribers).push(tx);
        rx
    }

    /// Deliver `event` to every live subscriber. Returns how many received it.
    pub fn publish(&self, event: ConfigEvent) -> usize {
        let mut subs = lock(&self.subscribers);
        subs.retain(|tx| tx.send(event).is_ok());
        subs.len()
    }
}

/// Lock a mutex, recovering the data if a previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
