//! Config command - View and manage VaultSync configuration
//!
//! Provides the `vaultsync config` CLI command which:
//! 1. Shows the current configuration (YAML or JSON)
//! 2. Validates the configuration file and reports errors
//! 3. Writes a starter configuration file

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;
use vaultsync_core::config::{Config, ConfigBuilder};

use super::CliContext;

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Validate configuration file
    Validate,
    /// Write a starter configuration file
    Init {
        /// Vault folder holding the notebooks
        #[arg(long)]
        vault: Option<PathBuf>,
        /// Mirror folder kept in step by the cloud sync client
        #[arg(long)]
        mirror: Option<PathBuf>,
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommand {
    /// Execute the config command
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(ctx).await,
            ConfigCommand::Validate => self.execute_validate(ctx).await,
            ConfigCommand::Init {
                vault,
                mirror,
                force,
            } => self.execute_init(ctx, vault.clone(), mirror.clone(), *force).await,
        }
    }

    /// Show current configuration
    async fn execute_show(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.formatter();
        let config = ctx.load_config();

        info!(config_path = %ctx.config_path.display(), "Showing configuration");

        if ctx.is_json() {
            let json = serde_json::to_value(&config)
                .context("Failed to serialize configuration to JSON")?;
            formatter.print_json(&json);
        } else {
            formatter.success(&format!("Configuration ({})", ctx.config_path.display()));
            formatter.info("");

            let yaml = serde_yaml::to_string(&config)
                .context("Failed to serialize configuration to YAML")?;

            for line in yaml.lines() {
                formatter.info(line);
            }
        }

        Ok(())
    }

    /// Validate configuration file
    async fn execute_validate(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.formatter();
        let config_path = &ctx.config_path;

        // Load the file explicitly, not load_or_default
        let config = match Config::load(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                if !config_path.exists() {
                    if ctx.is_json() {
                        let json = serde_json::json!({
                            "valid": false,
                            "config_path": config_path.display().to_string(),
                            "errors": ["Configuration file not found. Using defaults."],
                        });
                        formatter.print_json(&json);
                    } else {
                        formatter.info(&format!(
                            "Configuration file not found at {}",
                            config_path.display()
                        ));
                        formatter.info("Using default configuration. Run 'vaultsync config init' to create one.");
                    }
                    return Ok(());
                }

                if ctx.is_json() {
                    let json = serde_json::json!({
                        "valid": false,
                        "config_path": config_path.display().to_string(),
                        "errors": [format!("Failed to parse configuration: {}", e)],
                    });
                    formatter.print_json(&json);
                } else {
                    formatter.error(&format!("Failed to parse configuration: {}", e));
                    formatter.info(&format!("File: {}", config_path.display()));
                }
                return Ok(());
            }
        };

        info!(config_path = %config_path.display(), "Validating configuration");

        let errors = config.validate();

        if ctx.is_json() {
            let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            let json = serde_json::json!({
                "valid": errors.is_empty(),
                "config_path": config_path.display().to_string(),
                "errors": error_strings,
            });
            formatter.print_json(&json);
        } else if errors.is_empty() {
            formatter.success("Configuration is valid");
            formatter.info(&format!("File: {}", config_path.display()));
        } else {
            formatter.error(&format!(
                "Configuration has {} error{}:",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            ));
            formatter.info(&format!("File: {}", config_path.display()));
            formatter.info("");
            for error in &errors {
                formatter.info(&format!("  {} - {}", error.field, error.message));
            }
        }

        Ok(())
    }

    /// Write a starter configuration file
    async fn execute_init(
        &self,
        ctx: &CliContext,
        vault: Option<PathBuf>,
        mirror: Option<PathBuf>,
        force: bool,
    ) -> Result<()> {
        let formatter = ctx.formatter();
        let config_path = &ctx.config_path;

        if config_path.exists() && !force {
            formatter.error(&format!(
                "{} already exists; pass --force to overwrite",
                config_path.display()
            ));
            return Ok(());
        }

        let config = starter_config(vault, mirror);
        ctx.save_config(&config)?;
        info!(config_path = %config_path.display(), "Wrote starter configuration");

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "config_path": config_path.display().to_string(),
            }));
        } else {
            formatter.success(&format!("Wrote {}", config_path.display()));
            formatter.info("Enroll notebooks with 'vaultsync notebooks enroll <name>'.");
        }
        Ok(())
    }
}

/// Defaults with the given folders filled in; sync starts enabled so the
/// first enrolled notebook syncs without another edit.
fn starter_config(vault: Option<PathBuf>, mirror: Option<PathBuf>) -> Config {
    let mut builder = ConfigBuilder::new().sync_enabled(true);
    if let Some(vault) = vault {
        builder = builder.vault_root(vault);
    }
    if let Some(mirror) = mirror {
        builder = builder.mirror_root(mirror);
    }
    builder.build()
}
