//! CLI command implementations for panoptes.
//!
//! Provides subcommand handlers for:
//! - `panoptes status`: backend setup status, optionally polled
//! - `panoptes validate`: probe a provider endpoint/key pair
//! - `panoptes configure`: probe, then save if the probe passed
//! - `panoptes switch <network>`: change the active network
//! - `panoptes clear`: delete stored provider credentials
//! - `panoptes history`: setup journal
//! - `panoptes config show|init|set|reset`: configuration management

use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;

use crate::config;
use crate::journal::JournalEntry;
use crate::notice::{ConsoleNotifier, Notice, Notify};
use crate::setup::SetupContext;
use crate::setup::types::{SetupStatus, SwitchOutcome};

/// Output format for reporting commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

fn context() -> Result<SetupContext> {
    SetupContext::from_config(&config::load(), Arc::new(ConsoleNotifier))
}

// ---------------------------------------------------------------------------
// panoptes status
// ---------------------------------------------------------------------------

/// Show backend setup status. With `watch`, refetch every `watch` seconds
/// and print whenever the status changes.
pub fn run_status(format: OutputFormat, watch: Option<u64>) -> Result<()> {
    let ctx = context()?;
    let status = ctx.status_controller();
    let preferred = ctx.store.preferred_network();

    let mut last = status.fetch_status().ok();
    match &last {
        Some(current) => print_status(current, preferred.as_deref(), format)?,
        None if watch.is_none() => anyhow::bail!("setup status unavailable"),
        None => {}
    }

    let Some(secs) = watch else {
        return Ok(());
    };
    let secs = secs.max(1);
    ConsoleNotifier.notify(Notice::info(format!(
        "Watching setup status every {secs}s (Ctrl-C to stop)"
    )));

    loop {
        std::thread::sleep(Duration::from_secs(secs));
        let Ok(current) = status.fetch_status() else {
            continue;
        };
        if last.as_ref() != Some(&current) {
            println!(
                "{}",
                format!("[{}]", chrono::Local::now().format("%H:%M:%S")).dimmed()
            );
            print_status(&current, ctx.store.preferred_network().as_deref(), format)?;
            last = Some(current);
        }
    }
}

fn print_status(status: &SetupStatus, preferred: Option<&str>, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "status": status,
                "preferred_network": preferred,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Csv => {
            println!("is_configured,active_network,active_endpoint,configured_networks");
            println!(
                "{},{},{},{}",
                status.is_configured,
                status.active_network.as_deref().unwrap_or(""),
                status.active_endpoint.as_deref().unwrap_or(""),
                status.configured_networks.join(";"),
            );
        }
        OutputFormat::Table => print_status_table(status, preferred),
    }
    Ok(())
}

fn print_status_table(status: &SetupStatus, preferred: Option<&str>) {
    println!("{}", "Panoptes Setup Status".bold().cyan());
    println!("{}", "=".repeat(40));

    print_item(
        "Configured",
        status.is_configured,
        if status.is_configured { "yes" } else { "no" },
    );
    print_item(
        "Active network",
        status.active_network.is_some(),
        status.active_network.as_deref().unwrap_or("none"),
    );
    print_item(
        "Endpoint",
        status.active_endpoint.is_some(),
        status.active_endpoint.as_deref().unwrap_or("none"),
    );
    let networks = if status.configured_networks.is_empty() {
        "none".to_string()
    } else {
        status.configured_networks.join(", ")
    };
    print_item("Networks", !status.configured_networks.is_empty(), &networks);
    print_item("Preferred (local)", true, preferred.unwrap_or("not set"));
}

fn print_item(label: &str, ok: bool, detail: &str) {
    let mark = if ok { "●".green() } else { "○".yellow() };
    let label = format!("{:<18}", format!("{label}:"));
    println!("  {mark} {} {detail}", label.bold());
}

// ---------------------------------------------------------------------------
// panoptes validate / configure
// ---------------------------------------------------------------------------

/// Probe an endpoint/key pair without saving it.
pub fn run_validate(endpoint: &str, api_key: &str, network: &str) -> Result<()> {
    let ctx = context()?;
    let mut form = ctx.configurator(network);
    form.fill(endpoint, api_key);

    let outcome = form.validate()?;
    if !outcome.is_valid() {
        anyhow::bail!("validation failed for {network}");
    }
    Ok(())
}

/// Probe an endpoint/key pair and save it if the probe passes.
pub fn run_configure(endpoint: &str, api_key: &str, network: &str) -> Result<()> {
    let ctx = context()?;
    let status = Arc::new(ctx.status_controller());

    let refresh = status.clone();
    let mut form = ctx
        .configurator(network)
        .on_saved(move || refresh.notify_config_update())
        .on_close(|| println!("{}", "Done.".dimmed()));
    form.fill(endpoint, api_key);

    let outcome = form.validate()?;
    if !outcome.is_valid() {
        anyhow::bail!("not saving: validation failed for {network}");
    }
    form.save()?;

    if let Some(current) = status.status() {
        println!();
        print_status_table(&current, ctx.store.preferred_network().as_deref());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// panoptes switch / clear
// ---------------------------------------------------------------------------

pub fn run_switch(network: &str) -> Result<()> {
    let ctx = context()?;
    let status = ctx.status_controller();

    match status.switch_network(network) {
        SwitchOutcome::Switched => {
            if let Some(current) = status.status() {
                println!();
                print_status_table(&current, Some(network));
            }
            Ok(())
        }
        SwitchOutcome::Busy { pending } => {
            anyhow::bail!("a switch to {pending} is already in progress")
        }
        SwitchOutcome::Failed { reason } => anyhow::bail!("switch failed: {reason}"),
    }
}

pub fn run_clear(assume_yes: bool) -> Result<()> {
    if !assume_yes && !confirm("Clear stored provider credentials on the backend?")? {
        println!("{}", "Aborted.".yellow());
        return Ok(());
    }

    let ctx = context()?;
    let status = ctx.status_controller();
    if !status.clear_credentials() {
        anyhow::bail!("failed to clear credentials");
    }
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

// ---------------------------------------------------------------------------
// panoptes history
// ---------------------------------------------------------------------------

/// Show recorded setup operations, newest last.
pub fn run_history(format: OutputFormat, days: Option<u32>) -> Result<()> {
    let ctx = context()?;
    let entries = ctx.journal.read_since_days(days);

    if entries.is_empty() {
        println!("{}", "No setup operations recorded yet.".yellow());
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Csv => print_history_csv(&entries),
        OutputFormat::Table => print_history_table(&entries),
    }
    Ok(())
}

fn print_history_table(entries: &[JournalEntry]) {
    println!("{}", "Setup History".bold().cyan());
    println!("{}", "=".repeat(72));
    println!(
        "  {:<20} {:<18} {:<10} {:>7}  Detail",
        "When", "Operation", "Network", "ms"
    );
    println!("  {}", "-".repeat(70));

    for entry in entries {
        let when = chrono::DateTime::parse_from_rfc3339(&entry.timestamp)
            .map(|t| {
                t.with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string()
            })
            .unwrap_or_else(|_| entry.timestamp.clone());
        let line = format!(
            "  {:<20} {:<18} {:<10} {:>7}  {}",
            when,
            entry.operation.to_string(),
            entry.network.as_deref().unwrap_or("-"),
            entry
                .latency_ms
                .map(|ms| ms.to_string())
                .unwrap_or_else(|| "-".to_string()),
            entry.detail.as_deref().unwrap_or(""),
        );
        if entry.success {
            println!("{line}");
        } else {
            println!("{}", line.red());
        }
    }

    let failures = entries.iter().filter(|e| !e.success).count();
    println!();
    println!(
        "  {} {}   {} {}",
        "Operations:".bold(),
        entries.len(),
        "Failures:".bold(),
        failures
    );
}

fn print_history_csv(entries: &[JournalEntry]) {
    println!("timestamp,operation,network,success,latency_ms,detail");
    for e in entries {
        println!(
            "{},{},{},{},{},{}",
            e.timestamp,
            e.operation,
            e.network.as_deref().unwrap_or(""),
            e.success,
            e.latency_ms.map(|ms| ms.to_string()).unwrap_or_default(),
            e.detail.as_deref().unwrap_or("").replace(',', ";"),
        );
    }
}

// ---------------------------------------------------------------------------
// panoptes config
// ---------------------------------------------------------------------------

pub fn run_config_show() -> Result<()> {
    let effective = config::show_effective_config()?;

    let show_path = |label: &str, path: Option<&std::path::Path>| {
        let shown = path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none)".to_string());
        println!("{} {shown}", format!("# {label:<16}").dimmed());
    };
    show_path("global config:", config::global_config_file().as_deref());
    show_path("project config:", config::project_config_file().as_deref());
    if let Ok(ctx) = context() {
        show_path("local storage:", Some(ctx.store.path()));
        show_path("journal:", ctx.journal.path());
    }
    println!();

    println!("{effective}");
    Ok(())
}

pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!("{} {}", "Wrote".green(), path.display());
    Ok(())
}

pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} {key} = {value}", "Set".green());
    Ok(())
}

pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!("{} {}", "Reset".green(), path.display());
    Ok(())
}
