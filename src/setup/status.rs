/// Cached view of the backend setup state and the operations that change it.
///
/// Every state-changing operation ends with a broadcast on the shared
/// [`ConfigBus`] and a refetch, so independent consumers resynchronize
/// without holding a reference to this controller. The cache is only ever
/// replaced by a successful fetch; failures leave it untouched.
///
/// All methods take `&self`; share the controller behind an `Arc` when
/// several threads drive it.
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use crate::api::{ApiError, Reply, SetupApi};
use crate::events::{ConfigBus, ConfigEvent};
use crate::journal::{Journal, JournalEntry, Operation};
use crate::notice::{Notice, Notify};
use crate::store::{LocalStore, NETWORK_KEY};

use super::liveness::Liveness;
use super::types::{SetupStatus, SwitchOutcome, SwitchState};

/// Notice shown when the status fetch fails.
pub const MSG_STATUS_FAILED: &str = "Failed to load setup status";

pub struct NetworkConfigStatus {
    api: Arc<dyn SetupApi>,
    notifier: Arc<dyn Notify>,
    bus: Arc<ConfigBus>,
    store: Arc<LocalStore>,
    journal: Journal,
    cache: Mutex<Option<SetupStatus>>,
    switch: Mutex<SwitchState>,
    liveness: Liveness,
}

impl NetworkConfigStatus {
    pub fn new(
        api: Arc<dyn SetupApi>,
        notifier: Arc<dyn Notify>,
        bus: Arc<ConfigBus>,
        store: Arc<LocalStore>,
    ) -> Self {
        Self {
            api,
            notifier,
            bus,
            store,
            journal: Journal::disabled(),
            cache: Mutex::new(None),
            switch: Mutex::new(SwitchState::Idle),
            liveness: Liveness::new(),
        }
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = journal;
        self
    }

    /// Last successfully fetched status.
    pub fn status(&self) -> Option<SetupStatus> {
        lock(&self.cache).clone()
    }

    pub fn switch_state(&self) -> SwitchState {
        lock(&self.switch).clone()
    }

    /// Stop applying late responses to this controller.
    pub fn teardown(&self) {
        self.liveness.teardown();
    }

    // -- Operations --

    /// Fetch the backend status and replace the cache on success.
    pub fn fetch_status(&self) -> Result<SetupStatus, ApiError> {
        let start = Instant::now();
        let result = self.api.fetch_status();
        let latency_ms = start.elapsed().as_millis() as u64;

        let mut entry =
            JournalEntry::new(Operation::FetchStatus, result.is_ok()).latency_ms(latency_ms);
        if let Err(e) = &result {
            entry = entry.detail(e.to_string());
        }
        self.journal.record(entry);

        if !self.liveness.is_alive() {
            return result;
        }

        match &result {
            Ok(status) => *lock(&self.cache) = Some(status.clone()),
            Err(_) => self.notifier.notify(Notice::error(MSG_STATUS_FAILED)),
        }
        result
    }

    /// Switch the backend's active network.
    ///
    /// Only one switch may be pending at a time, whatever its target; a
    /// second call while one is in flight returns [`SwitchOutcome::Busy`]
    /// naming the pending target and sends nothing.
    pub fn switch_network(&self, target: &str) -> SwitchOutcome {
        {
            let mut state = lock(&self.switch);
            if let Some(pending) = state.pending_target() {
                let pending = pending.to_string();
                self.notifier.notify(Notice::warning(format!(
                    "Already switching to {pending}; try again when it finishes"
                )));
                return SwitchOutcome::Busy { pending };
            }
            *state = SwitchState::Pending {
                target: target.to_string(),
            };
        }

        let start = Instant::now();
        let result = self.api.switch_network(target);
        let latency_ms = start.elapsed().as_millis() as u64;
        let failure = match result {
            Ok(Reply::Accepted(())) => None,
            Ok(Reply::Rejected { status, body }) => Some(
                body.server_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("HTTP {status}")),
            ),
            Err(e) => Some(e.to_string()),
        };

        *lock(&self.switch) = SwitchState::Done {
            target: target.to_string(),
            succeeded: failure.is_none(),
        };

        let mut entry = JournalEntry::new(Operation::SwitchNetwork, failure.is_none())
            .network(target)
            .latency_ms(latency_ms);
        if let Some(reason) = &failure {
            entry = entry.detail(reason.clone());
        }
        self.journal.record(entry);

        if let Some(reason) = failure {
            if self.liveness.is_alive() {
                self.notifier.notify(Notice::error(format!(
                    "Failed to switch to {target}: {reason}"
                )));
            }
            return SwitchOutcome::Failed { reason };
        }

        // Storage and broadcast are process-wide and mirror a real backend
        // change, so they happen even after teardown.
        let stored = self.store.set(NETWORK_KEY, target);
        self.bus.publish(ConfigEvent::NetworkConfigUpdated);

        if self.liveness.is_alive() {
            if let Err(e) = stored {
                self.notifier.notify(Notice::warning(format!(
                    "Switched, but could not remember the selection: {e}"
                )));
            }
            self.notifier.notify(Notice::success(format!("Switched to {target}")));
            let _ = self.fetch_status();
        }

        SwitchOutcome::Switched
    }

    /// Delete the stored provider credentials on the backend.
    ///
    /// Any 2xx counts as success regardless of body; a non-2xx or a
    /// transport failure is reported and changes nothing locally.
    pub fn clear_credentials(&self) -> bool {
        let start = Instant::now();
        let result = self.api.clear_credentials();
        let latency_ms = start.elapsed().as_millis() as u64;

        let failure = match result {
            Ok(Reply::Accepted(())) => None,
            Ok(Reply::Rejected { status, .. }) => Some(format!("HTTP {status}")),
            Err(_) => Some("network unavailable".to_string()),
        };

        let mut entry = JournalEntry::new(Operation::ClearCredentials, failure.is_none())
            .latency_ms(latency_ms);
        if let Some(reason) = &failure {
            entry = entry.detail(reason.clone());
        }
        self.journal.record(entry);

        if let Some(reason) = failure {
            if self.liveness.is_alive() {
                self.notifier.notify(Notice::error(format!(
                    "Failed to clear credentials ({reason})"
                )));
            }
            return false;
        }

        self.bus.publish(ConfigEvent::NetworkConfigUpdated);
        if self.liveness.is_alive() {
            self.notifier.notify(Notice::success("Credentials cleared"));
            let _ = self.fetch_status();
        }
        true
    }

    /// Broadcast a configuration change made elsewhere and resynchronize.
    pub fn notify_config_update(&self) {
        self.bus.publish(ConfigEvent::NetworkConfigUpdated);
        if self.liveness.is_alive() {
            let _ = self.fetch_status();
        }
    }

    /// Drain pending bus events and refetch once if there were any.
    ///
    /// For consumers that hold their own subscription and poll it.
    pub fn sync_from(&self, events: &Receiver<ConfigEvent>) -> usize {
        let received = events.try_iter().count();
        if received > 0 && self.liveness.is_alive() {
            let _ = self.fetch_status();
        }
        received
    }
}

/// Lock a mutex, recovering the data if a previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
