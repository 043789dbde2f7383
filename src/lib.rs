//! Panoptes setup client.
//!
//! Drives the backend `/setup/*` endpoints: probe and save provider
//! credentials, read setup status, switch the active network and clear
//! stored credentials. The `panoptes` binary wraps this library in a CLI.

pub mod api;
pub mod cli;
pub mod config;
pub mod events;
pub mod journal;
pub mod notice;
pub mod setup;
pub mod store;
