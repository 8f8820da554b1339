//! Status command - Show what a sync pass would do
//!
//! Provides the `vaultsync status` CLI command which:
//! 1. Evaluates the entry guards and prints the settings help text
//! 2. Shows the vault and mirror locations
//! 3. Lists enrolled notebooks and pending companion-app events

use anyhow::Result;
use clap::Args;
use vaultsync_audit::ActionLogReader;

use super::{build_orchestrator, dir_state, plural, CliContext};

/// Status command
#[derive(Debug, Args)]
pub struct StatusCommand {}

impl StatusCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.formatter();
        let config = ctx.load_config();
        let engine = build_orchestrator(&config);

        let help = engine.settings_help_text(&config.sync).await;
        let vault = config.vault_root();
        let mirror = config.mirror_root();
        let pending_events = match engine.locate_mirror() {
            Some(mirror) => std::fs::read_dir(mirror.events_dir())
                .map(|dir| {
                    dir.filter_map(|e| e.ok())
                        .filter(|e| {
                            e.path()
                                .extension()
                                .and_then(|x| x.to_str())
                                .is_some_and(|x| x.eq_ignore_ascii_case("json"))
                        })
                        .count()
                })
                .unwrap_or(0),
            None => 0,
        };
        let log_entries = ActionLogReader::new(engine.vault().sync_log_path())
            .read()
            .await
            .map(|contents| contents.entries.len())
            .unwrap_or(0);

        if ctx.is_json() {
            let json = serde_json::json!({
                "status": help,
                "enabled": config.sync.enabled,
                "vault": vault.display().to_string(),
                "mirror": mirror.as_ref().map(|m| m.display().to_string()),
                "notebooks": config.sync.notebooks,
                "pending_events": pending_events,
                "action_log_entries": log_entries,
            });
            formatter.print_json(&json);
            return Ok(());
        }

        formatter.success(&help);
        formatter.info("");
        formatter.info(&format!("Vault:     {} ({})", vault.display(), dir_state(&vault)));
        match &mirror {
            Some(m) => formatter.info(&format!("Mirror:    {} ({})", m.display(), dir_state(m))),
            None => formatter.info("Mirror:    not configured"),
        }
        formatter.info(&format!(
            "Sync:      {}",
            if config.sync.enabled { "enabled" } else { "disabled" }
        ));
        if config.sync.notebooks.is_empty() {
            formatter.info("Notebooks: none enrolled");
        } else {
            let names: Vec<&str> = config.sync.notebooks.iter().map(String::as_str).collect();
            formatter.info(&format!("Notebooks: {}", names.join(", ")));
        }
        if pending_events > 0 {
            formatter.info(&format!(
                "Pending:   {} from the companion app",
                plural(pending_events, "event")
            ));
        }
        formatter.info(&format!("Log:       {}", plural(log_entries, "entry")));
        Ok(())
    }
}
