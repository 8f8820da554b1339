//! Hash command - Print the provider content hash of a file

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use vaultsync_sync::hasher::ContentHasher;

use super::CliContext;

/// Hash command
#[derive(Debug, Args)]
pub struct HashCommand {
    /// File to hash
    pub file: PathBuf,
}

impl HashCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.formatter();
        let hash = ContentHasher::hash_file(&self.file)
            .await
            .with_context(|| format!("Failed to hash {}", self.file.display()))?;

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "file": self.file.display().to_string(),
                "content_hash": hash.as_str(),
            }));
        } else {
            println!("{}  {}", hash, self.file.display());
        }
        Ok(())
    }
}
