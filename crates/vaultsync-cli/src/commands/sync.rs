//! Sync command - Run sync passes
//!
//! Provides the `vaultsync sync` CLI command which:
//! 1. Loads configuration and wires the orchestrator
//! 2. Runs one pass, or with `--watch` keeps running passes on a timer
//! 3. Persists notebooks enrolled by companion-app events
//! 4. Displays the pass summary

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};
use vaultsync_core::config::Config;
use vaultsync_core::domain::SyncResult;
use vaultsync_sync::{SyncOrchestrator, SyncScheduler};

use super::{build_orchestrator, duration_display, plural, CliContext};
use crate::output::OutputFormatter;

/// How often `--watch` checks for a "sync now" request
const REQUEST_POLL: Duration = Duration::from_secs(1);

/// Sync command with clap options
#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Keep running, one pass every `sync.interval_secs`
    #[arg(long)]
    pub watch: bool,
}

impl SyncCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.formatter();
        let mut config = ctx.load_config_for_update()?;
        let engine = build_orchestrator(&config);

        if !self.watch {
            let result = run_pass(&engine, &mut config, ctx).await;
            print_result(&result, ctx, formatter.as_ref());
            return Ok(());
        }

        let interval = Duration::from_secs(config.sync.interval_secs.max(1));
        formatter.info(&format!(
            "Watching: one pass every {}s, Ctrl-C to stop",
            interval.as_secs()
        ));

        let (scheduler, _flag) = SyncScheduler::new(interval, REQUEST_POLL);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, stopping after the current pass");
                let _ = shutdown_tx.send(true);
            }
        });

        let engine = Arc::new(engine);
        let config = Arc::new(Mutex::new(config));
        let ctx_owned = ctx.clone();
        scheduler
            .run(shutdown_rx, move || {
                let engine = Arc::clone(&engine);
                let config = Arc::clone(&config);
                let ctx = ctx_owned.clone();
                async move {
                    let mut config = config.lock().await;
                    let result = run_pass(&engine, &mut config, &ctx).await;
                    print_result(&result, &ctx, ctx.formatter().as_ref());
                }
            })
            .await;

        Ok(())
    }
}

/// One pass; enrollment changes made by events are written back.
async fn run_pass(engine: &SyncOrchestrator, config: &mut Config, ctx: &CliContext) -> SyncResult {
    let before = config.sync.notebooks.clone();
    let result = engine.run(&mut config.sync).await;
    if config.sync.notebooks != before {
        info!(notebooks = ?config.sync.notebooks, "Enrollment changed during pass");
        if let Err(e) = ctx.save_config(config) {
            warn!(error = %e, "Failed to persist enrolled notebooks");
        }
    }
    result
}

fn print_result(result: &SyncResult, ctx: &CliContext, formatter: &dyn OutputFormatter) {
    if ctx.is_json() {
        match serde_json::to_value(result) {
            Ok(json) => formatter.print_json(&json),
            Err(e) => formatter.error(&format!("Failed to serialize result: {e}")),
        }
        return;
    }

    if let Some(reason) = &result.blocked {
        formatter.warn(&reason.to_string());
        return;
    }

    if result.copied() == 0 && result.moved == 0 && result.errors.is_empty() {
        formatter.success("Already up to date");
    } else {
        formatter.success(&format!(
            "Sync completed in {}",
            duration_display(result.duration_ms)
        ));
    }

    if result.pushed > 0 {
        formatter.info(&format!("Pushed:    {}", plural(result.pushed as usize, "note")));
    }
    if result.pulled > 0 {
        formatter.info(&format!("Pulled:    {}", plural(result.pulled as usize, "note")));
    }
    if result.moved > 0 {
        formatter.info(&format!("Moved:     {}", plural(result.moved as usize, "note")));
    }
    formatter.info(&format!("In sync:   {}", plural(result.in_sync as usize, "note")));

    if !result.conflicts.is_empty() {
        formatter.warn(&format!(
            "Conflict ({}): changed on both sides, left untouched",
            result.conflicts.len()
        ));
        for note in &result.conflicts {
            formatter.info(&format!("  - {}", note));
        }
    }

    if !result.errors.is_empty() {
        formatter.error(&format!(
            "{} occurred:",
            plural(result.errors.len(), "error")
        ));
        for err in &result.errors {
            formatter.info(&format!("  - {}", err));
        }
    }
}
