//! Notebooks command - List and enroll notebooks
//!
//! Provides the `vaultsync notebooks` CLI command which:
//! 1. Lists the vault's notebook folders and whether each is synced
//! 2. Enrolls or unenrolls a notebook and saves the configuration

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;
use vaultsync_core::domain::bare_name;

use super::CliContext;

/// Notebook subcommands
#[derive(Debug, Subcommand)]
pub enum NotebooksCommand {
    /// List notebooks in the vault
    List,
    /// Add a notebook to sync
    Enroll {
        /// Notebook folder name
        name: String,
    },
    /// Remove a notebook from sync
    Unenroll {
        /// Notebook folder name
        name: String,
    },
}

impl NotebooksCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        match self {
            NotebooksCommand::List => self.execute_list(ctx).await,
            NotebooksCommand::Enroll { name } => self.execute_enroll(ctx, name, true).await,
            NotebooksCommand::Unenroll { name } => self.execute_enroll(ctx, name, false).await,
        }
    }

    async fn execute_list(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.formatter();
        let config = ctx.load_config();
        let vault = config.vault_root();

        let mut notebooks = list_notebook_dirs(&vault)?;
        // Enrolled notebooks without a folder yet are created by the next pass.
        for enrolled in &config.sync.notebooks {
            if !notebooks.contains(enrolled) {
                notebooks.push(enrolled.clone());
            }
        }
        notebooks.sort();

        if ctx.is_json() {
            let json: Vec<serde_json::Value> = notebooks
                .iter()
                .map(|nb| {
                    serde_json::json!({
                        "name": nb,
                        "enrolled": config.sync.is_enrolled(nb),
                        "exists": vault.join(nb).is_dir(),
                    })
                })
                .collect();
            formatter.print_json(&serde_json::Value::Array(json));
            return Ok(());
        }

        if notebooks.is_empty() {
            formatter.info(&format!("No notebooks in {}", vault.display()));
            return Ok(());
        }
        formatter.success(&format!("Notebooks in {}", vault.display()));
        for nb in &notebooks {
            let mark = if config.sync.is_enrolled(nb) { "[x]" } else { "[ ]" };
            formatter.info(&format!("{} {}", mark, nb));
        }
        Ok(())
    }

    async fn execute_enroll(&self, ctx: &CliContext, name: &str, enroll: bool) -> Result<()> {
        let formatter = ctx.formatter();
        let mut config = ctx.load_config_for_update()?;

        let notebook = bare_name(name)
            .filter(|n| n == name.trim())
            .with_context(|| format!("'{}' is not a notebook folder name", name))?;

        let changed = if enroll {
            config.sync.enroll(notebook.clone())
        } else {
            config.sync.unenroll(&notebook)
        };
        if changed {
            ctx.save_config(&config)?;
            info!(notebook = %notebook, enrolled = enroll, "Enrollment updated");
        }

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "notebook": notebook,
                "enrolled": config.sync.is_enrolled(&notebook),
                "changed": changed,
            }));
        } else if !changed {
            formatter.info(&format!(
                "{} is already {}",
                notebook,
                if enroll { "enrolled" } else { "not enrolled" }
            ));
        } else if enroll {
            formatter.success(&format!("Enrolled {}", notebook));
        } else {
            formatter.success(&format!("Unenrolled {}", notebook));
        }
        Ok(())
    }
}

/// Visible directories directly below the vault root
fn list_notebook_dirs(vault: &Path) -> Result<Vec<String>> {
    if !vault.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in std::fs::read_dir(vault)
        .with_context(|| format!("Failed to list vault {}", vault.display()))?
    {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with('.') && entry.path().is_dir() {
            names.push(name);
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_notebook_dirs_skips_hidden_and_files() {
        let vault = TempDir::new().unwrap();
        std::fs::create_dir(vault.path().join("Work")).unwrap();
        std::fs::create_dir(vault.path().join(".meta")).unwrap();
        std::fs::write(vault.path().join("loose.md"), "x").unwrap();

        let names = list_notebook_dirs(vault.path()).unwrap();
        assert_eq!(names, vec!["Work".to_string()]);
    }

    #[test]
    fn test_missing_vault_lists_nothing() {
        let dir = TempDir::new().unwrap();
        assert!(list_notebook_dirs(&dir.path().join("gone")).unwrap().is_empty());
    }
}
