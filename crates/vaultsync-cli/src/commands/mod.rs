//! CLI subcommands and the wiring they share

pub mod completions;
pub mod config;
pub mod export;
pub mod hash;
pub mod log;
pub mod notebooks;
pub mod status;
pub mod sync;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use vaultsync_core::config::Config;
use vaultsync_core::domain::Replica;
use vaultsync_core::ports::{ConfiguredMirrorLocator, IdentityTagResolver};
use vaultsync_sync::SyncOrchestrator;

use crate::notifier::LogNotifier;
use crate::output::{OutputFormat, OutputFormatter};

/// Options every command needs
#[derive(Debug, Clone)]
pub struct CliContext {
    pub format: OutputFormat,
    pub config_path: PathBuf,
}

impl CliContext {
    pub fn new(format: OutputFormat, config_path: PathBuf) -> Self {
        Self {
            format,
            config_path,
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    pub fn formatter(&self) -> Box<dyn OutputFormatter> {
        self.format.formatter()
    }

    /// Load the configuration file, falling back to defaults
    pub fn load_config(&self) -> Config {
        let config = Config::load_or_default(&self.config_path);
        info!(config_path = %self.config_path.display(), "Loaded configuration");
        config
    }

    /// Load the configuration for a command that writes it back.
    ///
    /// A missing file starts from defaults. A file that exists but does not
    /// parse is an error so it is never replaced by defaults.
    pub fn load_config_for_update(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }
        let config = Config::load(&self.config_path).with_context(|| {
            format!(
                "Failed to parse configuration file {}",
                self.config_path.display()
            )
        })?;
        info!(config_path = %self.config_path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Write `config` back to the configuration file
    pub fn save_config(&self, config: &Config) -> Result<()> {
        config.save(&self.config_path).with_context(|| {
            format!(
                "Failed to write configuration file {}",
                self.config_path.display()
            )
        })
    }
}

/// Wire an orchestrator from configuration with the terminal adapters
pub fn build_orchestrator(config: &Config) -> SyncOrchestrator {
    SyncOrchestrator::new(
        Replica::local(config.vault_root()),
        Arc::new(ConfiguredMirrorLocator::new(config.mirror_root())),
        Arc::new(LogNotifier::new()),
        Arc::new(IdentityTagResolver),
    )
    .with_export(config.export.enabled)
}

/// `"1 note"` / `"2 notes"`
pub fn plural(count: usize, word: &str) -> String {
    format!("{} {}{}", count, word, if count == 1 { "" } else { "s" })
}

/// Human duration for pass timings
pub fn duration_display(ms: u64) -> String {
    if ms >= 1000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        format!("{}ms", ms)
    }
}

/// Whether `path` exists as a directory, for status displays
pub fn dir_state(path: &Path) -> &'static str {
    if path.is_dir() {
        "found"
    } else {
        "missing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "note"), "1 note");
        assert_eq!(plural(0, "note"), "0 notes");
        assert_eq!(plural(3, "error"), "3 errors");
    }

    #[test]
    fn test_load_for_update_refuses_malformed_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "vault: [unterminated\n").unwrap();
        let ctx = CliContext::new(OutputFormat::Human, path.clone());

        assert!(ctx.load_config_for_update().is_err());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "vault: [unterminated\n"
        );
    }

    #[test]
    fn test_load_for_update_defaults_when_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        let ctx = CliContext::new(OutputFormat::Human, dir.path().join("none.yaml"));

        let config = ctx.load_config_for_update().unwrap();
        assert!(config.sync.notebooks.is_empty());
    }

    #[test]
    fn test_duration_display() {
        assert_eq!(duration_display(250), "250ms");
        assert_eq!(duration_display(1500), "1.5s");
    }
}
