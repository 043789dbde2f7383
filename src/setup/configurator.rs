/// Two-step "test, then commit" controller for one network's provider
/// connection.
///
/// ```text
/// Idle ──validate──▶ Validating ──reply──▶ Validated(outcome) ──save──▶ Saving ──ok──▶ Saved
///   ▲                                        │        ▲                   │
///   └───────────── any field edit ───────────┘        └──── save failed ──┘
/// ```
///
/// A save is only sent when the most recent outcome is valid *and* was
/// computed for the current form revision. Every edit bumps the revision and
/// drops the outcome, so a stale "valid" can never authorize a save.
use std::sync::Arc;
use std::time::Instant;

use crate::api::{ApiError, CredentialsPayload, ProbeBody, Reply, SetupApi};
use crate::journal::{Journal, JournalEntry, Operation};
use crate::notice::{Notice, Notify};

use super::liveness::Liveness;
use super::types::{
    ConnectionCandidate, MSG_NETWORK_UNAVAILABLE, MSG_VALIDATION_FAILED, ValidationOutcome,
};

/// Notice shown when saving fails for any reason.
pub const MSG_SAVE_FAILED: &str = "Failed to save configuration";

type Callback = Box<dyn FnMut() + Send>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    Idle,
    Validating,
    Validated(ValidationOutcome),
    Saving,
    Saved,
}

/// Why a form operation did not complete.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfiguratorError {
    #[error("API key is required")]
    CredentialRequired,

    #[error("validate the connection before saving")]
    NotValidated,

    #[error("a request is already in progress")]
    Busy,

    #[error("configuration already saved")]
    Closed,

    #[error("Failed to save configuration")]
    SaveFailed,

    #[error("form was closed before the response arrived")]
    TornDown,
}

pub struct ConnectionConfigurator {
    network: String,
    candidate: ConnectionCandidate,
    revision: u64,
    state: FormState,
    validated_revision: Option<u64>,
    api: Arc<dyn SetupApi>,
    notifier: Arc<dyn Notify>,
    journal: Journal,
    liveness: Liveness,
    on_saved: Option<Callback>,
    on_close: Option<Callback>,
}

impl ConnectionConfigurator {
    pub fn new(
        network: impl Into<String>,
        api: Arc<dyn SetupApi>,
        notifier: Arc<dyn Notify>,
    ) -> Self {
        Self {
            network: network.into(),
            candidate: ConnectionCandidate::default(),
            revision: 0,
            state: FormState::Idle,
            validated_revision: None,
            api,
            notifier,
            journal: Journal::disabled(),
            liveness: Liveness::new(),
            on_saved: None,
            on_close: None,
        }
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = journal;
        self
    }

    /// Called first after a successful save.
    pub fn on_saved(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.on_saved = Some(Box::new(callback));
        self
    }

    /// Called after `on_saved`; the form is done.
    pub fn on_close(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.on_close = Some(Box::new(callback));
        self
    }

    // -- Form fields --

    pub fn set_endpoint(&mut self, endpoint_url: impl Into<String>) {
        let endpoint_url = endpoint_url.into();
        if endpoint_url != self.candidate.endpoint_url {
            self.candidate.endpoint_url = endpoint_url;
            self.field_edited();
        }
    }

    pub fn set_credential(&mut self, credential_secret: impl Into<String>) {
        let credential_secret = credential_secret.into();
        if credential_secret != self.candidate.credential_secret {
            self.candidate.credential_secret = credential_secret;
            self.field_edited();
        }
    }

    /// Set both fields at once.
    pub fn fill(&mut self, endpoint_url: impl Into<String>, credential_secret: impl Into<String>) {
        self.set_endpoint(endpoint_url);
        self.set_credential(credential_secret);
    }

    fn field_edited(&mut self) {
        self.revision += 1;
        self.validated_revision = None;
        if matches!(self.state, FormState::Validated(_)) {
            self.state = FormState::Idle;
        }
    }

    // -- State --

    pub fn state(&self) -> &FormState {
        &self.state
    }

    /// Outcome of the most recent probe for the current field values.
    pub fn outcome(&self) -> Option<&ValidationOutcome> {
        match &self.state {
            FormState::Validated(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn can_save(&self) -> bool {
        self.outcome().is_some_and(ValidationOutcome::is_valid)
            && self.validated_revision == Some(self.revision)
    }

    /// Handle that tears the form down from elsewhere.
    pub fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    // -- Operations --

    /// Probe the current endpoint/credential pair.
    ///
    /// Provider-side failures come back as `Ok` with an invalid outcome. `Err`
    /// means the probe was never sent or its reply arrived after teardown.
    pub fn validate(&mut self) -> Result<ValidationOutcome, ConfiguratorError> {
        self.ensure_interactive()?;

        if self.candidate.credential_missing() {
            self.field_edited();
            self.notifier.notify(Notice::error(ConfiguratorError::CredentialRequired.to_string()));
            return Err(ConfiguratorError::CredentialRequired);
        }

        let revision = self.revision;
        self.validated_revision = None;
        self.state = FormState::Validating;

        let start = Instant::now();
        let result = self.api.validate_credentials(&self.payload());
        let latency_ms = start.elapsed().as_millis() as u64;
        let outcome = interpret_probe(result);

        self.journal.record(
            JournalEntry::new(Operation::Validate, outcome.is_valid())
                .network(&self.network)
                .latency_ms(latency_ms)
                .detail(match outcome.chain_tip_height() {
                    Some(tip) => format!("chain tip {tip}"),
                    None => outcome.error_message().unwrap_or_default().to_string(),
                }),
        );

        if !self.liveness.is_alive() {
            self.state = FormState::Idle;
            return Err(ConfiguratorError::TornDown);
        }

        match (outcome.chain_tip_height(), outcome.error_message()) {
            (Some(tip), _) => self
                .notifier
                .notify(Notice::success(format!("Connected. Chain tip at slot {tip}"))),
            (None, Some(message)) => self.notifier.notify(Notice::error(message)),
            (None, None) => {}
        }

        self.state = FormState::Validated(outcome.clone());
        self.validated_revision = Some(revision);
        Ok(outcome)
    }

    /// Persist the credential; only allowed after a valid probe of the
    /// current field values.
    pub fn save(&mut self) -> Result<(), ConfiguratorError> {
        self.ensure_interactive()?;

        if !self.can_save() {
            self.notifier.notify(Notice::error("Validate the connection before saving"));
            return Err(ConfiguratorError::NotValidated);
        }

        let validated = std::mem::replace(&mut self.state, FormState::Saving);

        let start = Instant::now();
        let result = self.api.save_credentials(&self.payload());
        let latency_ms = start.elapsed().as_millis() as u64;
        let saved = matches!(result, Ok(Reply::Accepted(())));

        let mut entry = JournalEntry::new(Operation::Save, saved)
            .network(&self.network)
            .latency_ms(latency_ms);
        match &result {
            Ok(Reply::Rejected { status, .. }) => entry = entry.detail(format!("HTTP {status}")),
            Err(e) => entry = entry.detail(e.to_string()),
            Ok(Reply::Accepted(())) => {}
        }
        self.journal.record(entry);

        if !self.liveness.is_alive() {
            self.state = if saved { FormState::Saved } else { validated };
            return Err(ConfiguratorError::TornDown);
        }

        if !saved {
            self.state = validated;
            self.notifier.notify(Notice::error(MSG_SAVE_FAILED));
            return Err(ConfiguratorError::SaveFailed);
        }

        self.state = FormState::Saved;
        self.notifier.notify(Notice::success(format!(
            "Saved provider credentials for {}",
            self.network
        )));
        if let Some(callback) = self.on_saved.as_mut() {
            callback();
        }
        if let Some(callback) = self.on_close.as_mut() {
            callback();
        }
        Ok(())
    }

    fn ensure_interactive(&self) -> Result<(), ConfiguratorError> {
        match self.state {
            FormState::Saved => Err(ConfiguratorError::Closed),
            FormState::Validating | FormState::Saving => Err(ConfiguratorError::Busy),
            FormState::Idle | FormState::Validated(_) => Ok(()),
        }
    }

    fn payload(&self) -> CredentialsPayload {
        CredentialsPayload {
            grpc_endpoint: self.candidate.endpoint_url.clone(),
            api_key: self.candidate.credential_secret.clone(),
            network: self.network.clone(),
        }
    }
}

/// Map a probe exchange to an outcome.
///
/// Precedence for rejected probes: `error`, then `message`, then the
/// generic fallback.
fn interpret_probe(result: Result<Reply<ProbeBody>, ApiError>) -> ValidationOutcome {
    match result {
        Ok(Reply::Accepted(body)) => ValidationOutcome::from_chain_tip(body.chain_tip_slot),
        Ok(Reply::Rejected { body, .. }) => ValidationOutcome::rejected(
            body.server_message().unwrap_or(MSG_VALIDATION_FAILED),
        ),
        Err(_) => ValidationOutcome::rejected(MSG_NETWORK_UNAVAILABLE),
    }
}
