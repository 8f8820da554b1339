//! Export command - Write the search index without syncing

use anyhow::Result;
use clap::Args;

use super::{build_orchestrator, plural, CliContext};

/// Export command
#[derive(Debug, Args)]
pub struct ExportCommand {}

impl ExportCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.formatter();
        let config = ctx.load_config();
        let engine = build_orchestrator(&config);

        let summary = match engine.export(&config.sync).await {
            Ok(summary) => summary,
            Err(e) => {
                formatter.error(&format!("{:#}", e));
                return Ok(());
            }
        };
        let path = engine
            .locate_mirror()
            .map(|m| m.search_index_path().display().to_string())
            .unwrap_or_default();

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "path": path,
                "notes": summary.notes,
                "words": summary.words,
            }));
        } else {
            formatter.success(&format!("Search index written to {}", path));
            formatter.info(&format!(
                "{}, {}",
                plural(summary.notes, "note"),
                plural(summary.words, "word")
            ));
        }
        Ok(())
    }
}
