//! Log command - View action log entries
//!
//! Provides the `vaultsync log` CLI command which reads `<vault>/.synclog`
//! and shows the most recent entries, newest last.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::Args;
use tracing::info;
use vaultsync_audit::ActionLogReader;
use vaultsync_core::domain::{ActionEntry, Replica};

use super::{plural, CliContext};

/// Log command with filter arguments
#[derive(Debug, Args)]
pub struct LogCommand {
    /// Maximum number of entries to show
    #[arg(long, default_value = "50")]
    pub limit: usize,

    /// Only show entries of this kind (NEW, DEL, COPY, MOVE)
    #[arg(long)]
    pub kind: Option<String>,
}

impl LogCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.formatter();
        let config = ctx.load_config();
        let vault = Replica::local(config.vault_root());
        let reader = ActionLogReader::new(vault.sync_log_path());

        let contents = reader
            .read()
            .await
            .with_context(|| format!("Failed to read {}", reader.path().display()))?;
        info!(count = contents.entries.len(), "Read action log");

        let filtered: Vec<&ActionEntry> = contents
            .entries
            .iter()
            .filter(|entry| match &self.kind {
                Some(kind) => entry.kind().as_str().eq_ignore_ascii_case(kind),
                None => true,
            })
            .collect();
        let start = filtered.len().saturating_sub(self.limit);
        let shown = &filtered[start..];

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "entries": shown,
                "malformed": contents.malformed,
            }));
            return Ok(());
        }

        if shown.is_empty() {
            formatter.info("No action log entries");
        } else {
            formatter.success(&format!(
                "Showing {} of {}",
                plural(shown.len(), "entry"),
                filtered.len()
            ));
            for entry in shown {
                formatter.info(&format_entry(entry));
            }
        }
        if !contents.malformed.is_empty() {
            formatter.warn(&format!(
                "{} could not be parsed",
                plural(contents.malformed.len(), "line")
            ));
        }
        Ok(())
    }
}

fn format_entry(entry: &ActionEntry) -> String {
    let when = DateTime::from_timestamp_millis(entry.timestamp_ms())
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| entry.timestamp_ms().to_string());
    match entry.destination() {
        Some(dest) => format!(
            "{}  {:<4}  {} -> {}",
            when,
            entry.kind().as_str(),
            entry.path(),
            dest
        ),
        None => format!("{}  {:<4}  {}", when, entry.kind().as_str(), entry.path()),
    }
}
