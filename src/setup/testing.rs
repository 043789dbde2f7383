//! Scripted [`SetupApi`] fake for controller unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::api::{ApiError, CredentialsPayload, ProbeBody, Reply, SetupApi};
use crate::setup::types::SetupStatus;

type Scripted<T> = Mutex<VecDeque<Result<T, ApiError>>>;

#[derive(Default)]
pub struct ScriptedApi {
    probes: Scripted<Reply<ProbeBody>>,
    saves: Scripted<Reply<()>>,
    statuses: Scripted<SetupStatus>,
    switches: Scripted<Reply<()>>,
    clears: Scripted<Reply<()>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    credentials: Mutex<Option<CredentialsPayload>>,
    switch_targets: Mutex<Vec<String>>,
    switch_gate: Mutex<Option<(Sender<()>, Receiver<()>)>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_probe(&self, reply: Result<Reply<ProbeBody>, ApiError>) {
        self.probes.lock().unwrap().push_back(reply);
    }

    pub fn push_save(&self, reply: Result<Reply<()>, ApiError>) {
        self.saves.lock().unwrap().push_back(reply);
    }

    pub fn push_status(&self, reply: Result<SetupStatus, ApiError>) {
        self.statuses.lock().unwrap().push_back(reply);
    }

    pub fn push_switch(&self, reply: Result<Reply<()>, ApiError>) {
        self.switches.lock().unwrap().push_back(reply);
    }

    pub fn push_clear(&self, reply: Result<Reply<()>, ApiError>) {
        self.clears.lock().unwrap().push_back(reply);
    }

    /// Make the next switch call block until released.
    ///
    /// Returns a receiver that fires once the call is inside the fake, and a
    /// sender that lets it return.
    pub fn gate_switch(&self) -> (Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        *self.switch_gate.lock().unwrap() = Some((entered_tx, release_rx));
        (entered_rx, release_tx)
    }

    pub fn calls(&self, op: &str) -> usize {
        self.calls.lock().unwrap().get(op).copied().unwrap_or(0)
    }

    pub fn last_credentials(&self) -> Option<CredentialsPayload> {
        self.credentials.lock().unwrap().clone()
    }

    pub fn switch_targets(&self) -> Vec<String> {
        self.switch_targets.lock().unwrap().clone()
    }

    fn count(&self, op: &'static str) {
        *self.calls.lock().unwrap().entry(op).or_default() += 1;
    }
}

fn next<T>(queue: &Scripted<T>, fallback: Result<T, ApiError>) -> Result<T, ApiError> {
    queue.lock().unwrap().pop_front().unwrap_or(fallback)
}

impl SetupApi for ScriptedApi {
    fn validate_credentials(
        &self,
        payload: &CredentialsPayload,
    ) -> Result<Reply<ProbeBody>, ApiError> {
        self.count("validate");
        *self.credentials.lock().unwrap() = Some(payload.clone());
        next(
            &self.probes,
            Err(ApiError::Transport("no scripted probe".to_string())),
        )
    }

    fn save_credentials(&self, payload: &CredentialsPayload) -> Result<Reply<()>, ApiError> {
        self.count("save");
        *self.credentials.lock().unwrap() = Some(payload.clone());
        next(&self.saves, Ok(Reply::Accepted(())))
    }

    fn fetch_status(&self) -> Result<SetupStatus, ApiError> {
        self.count("status");
        next(&self.statuses, Ok(SetupStatus::default()))
    }

    fn switch_network(&self, network: &str) -> Result<Reply<()>, ApiError> {
        self.count("switch");
        self.switch_targets.lock().unwrap().push(network.to_string());
        let gate = self.switch_gate.lock().unwrap().take();
        if let Some((entered, release)) = gate {
            entered.send(()).unwrap();
            release.recv().unwrap();
        }
        next(&self.switches, Ok(Reply::Accepted(())))
    }

    fn clear_credentials(&self) -> Result<Reply<()>, ApiError> {
        self.count("clear");
        next(&self.clears, Ok(Reply::Accepted(())))
    }
}
