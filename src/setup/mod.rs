//! Setup workflow controllers.
//!
//! - [`configurator::ConnectionConfigurator`]: validate-then-save form for
//!   one network's provider credentials.
//! - [`status::NetworkConfigStatus`]: cached backend status plus network
//!   switch, credential clear, and change broadcast.
//!
//! [`SetupContext`] wires both to the resolved config: HTTP client, storage,
//! journal and a shared [`ConfigBus`].

pub mod configurator;
pub mod liveness;
pub mod status;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api::{HttpSetupApi, SetupApi};
use crate::config::PanoptesConfig;
use crate::events::ConfigBus;
use crate::journal::Journal;
use crate::notice::Notify;
use crate::store::LocalStore;

use configurator::ConnectionConfigurator;
use status::NetworkConfigStatus;

/// Shared collaborators for the setup controllers.
#[derive(Clone)]
pub struct SetupContext {
    pub api: Arc<dyn SetupApi>,
    pub notifier: Arc<dyn Notify>,
    pub bus: Arc<ConfigBus>,
    pub store: Arc<LocalStore>,
    pub journal: Journal,
}

impl SetupContext {
    /// Build the production context from config.
    pub fn from_config(config: &PanoptesConfig, notifier: Arc<dyn Notify>) -> Result<Self> {
        let dir = config
            .storage
            .resolve_dir()
            .context("could not determine storage directory (set PANOPTES_HOME)")?;

        let journal = if config.journal.enabled {
            Journal::in_dir(&dir)
        } else {
            Journal::disabled()
        };

        Ok(Self {
            api: Arc::new(HttpSetupApi::from_config(&config.backend)),
            notifier,
            bus: Arc::new(ConfigBus::new()),
            store: Arc::new(LocalStore::in_dir(&dir)),
            journal,
        })
    }

    pub fn status_controller(&self) -> NetworkConfigStatus {
        NetworkConfigStatus::new(
            self.api.clone(),
            self.notifier.clone(),
            self.bus.clone(),
            self.store.clone(),
        )
        .with_journal(self.journal.clone())
    }

    pub fn configurator(&self, network: impl Into<String>) -> ConnectionConfigurator {
        ConnectionConfigurator::new(network, self.api.clone(), self.notifier.clone())
            .with_journal(self.journal.clone())
    }
}
