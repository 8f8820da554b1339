//! Configuration module for VaultSync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, saving, validation, defaults, and a builder pattern for
//! programmatic use.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for VaultSync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub vault: VaultConfig,
    pub mirror: MirrorConfig,
    pub sync: SyncConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
}

/// Local note store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Root directory of the local vault.
    pub root: PathBuf,
}

/// Remote mirror settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Application folder inside the cloud-sync client's directory.
    /// `None` until the operator points VaultSync at it.
    pub root: Option<PathBuf>,
}

/// Synchronization settings consumed by each pass.
///
/// The enrolled notebook set is mutable during a pass: a `newnotebook`
/// event enrolls the notebook it creates. Callers persist the change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Master switch; a disabled configuration makes every pass a no-op.
    pub enabled: bool,
    /// Notebooks opted into synchronization.
    pub notebooks: BTreeSet<String>,
    /// File extensions (without the dot) recognized as note files.
    pub note_extensions: Vec<String>,
    /// Seconds between passes in `sync --watch` mode.
    pub interval_secs: u64,
}

/// Search index export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Whether to write the compressed search index after each pass.
    pub enabled: bool,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Emit JSON-formatted log lines instead of human-readable ones.
    pub json: bool,
}

// ---------------------------------------------------------------------------
// Config::load() / save()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Write the configuration as YAML to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/vaultsync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("vaultsync")
            .join("config.yaml")
    }

    /// Vault root with a leading `~` expanded.
    pub fn vault_root(&self) -> PathBuf {
        expand_tilde(&self.vault.root)
    }

    /// Mirror root with a leading `~` expanded, if configured.
    pub fn mirror_root(&self) -> Option<PathBuf> {
        self.mirror.root.as_deref().map(expand_tilde)
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

// ---------------------------------------------------------------------------
// SyncConfig helpers
// ---------------------------------------------------------------------------

impl SyncConfig {
    /// Whether `notebook` is enrolled in sync.
    pub fn is_enrolled(&self, notebook: &str) -> bool {
        self.notebooks.contains(notebook)
    }

    /// Enroll a notebook. Returns `true` if it was not enrolled before.
    pub fn enroll(&mut self, notebook: impl Into<String>) -> bool {
        self.notebooks.insert(notebook.into())
    }

    /// Remove a notebook from sync. Returns `true` if it was enrolled.
    pub fn unenroll(&mut self, notebook: &str) -> bool {
        self.notebooks.remove(notebook)
    }

    /// Whether `ext` (without dot, any case) is a recognized note extension.
    pub fn is_note_extension(&self, ext: &str) -> bool {
        self.note_extensions
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext))
    }

    /// Whether a directory entry named `name` takes part in synchronization.
    ///
    /// Hidden files, editor/sync-tool backups ending in `~` and files without a
    /// recognized note extension are never considered.
    pub fn is_note_file(&self, name: &str) -> bool {
        if name.is_empty() || name.starts_with('.') || name.ends_with('~') {
            return false;
        }
        match Path::new(name).extension().and_then(|e| e.to_str()) {
            Some(ext) => self.is_note_extension(ext),
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Config::default()
// ---------------------------------------------------------------------------

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("~/Notes"),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            notebooks: BTreeSet::new(),
            note_extensions: ["txt", "md", "rtf", "html"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            interval_secs: 300,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"sync.interval_secs"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- vault ---
        // Tilde paths are expanded at runtime, only check concrete ones.
        let root_str = self.vault.root.to_string_lossy();
        if !root_str.starts_with('~') && !self.vault.root.exists() {
            errors.push(ValidationError {
                field: "vault.root".into(),
                message: format!("directory does not exist: {}", self.vault.root.display()),
            });
        }

        // --- sync ---
        if self.sync.interval_secs == 0 {
            errors.push(ValidationError {
                field: "sync.interval_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.sync.note_extensions.is_empty() {
            errors.push(ValidationError {
                field: "sync.note_extensions".into(),
                message: "at least one note extension is required".into(),
            });
        }
        for ext in &self.sync.note_extensions {
            if ext.is_empty() || ext.contains('.') {
                errors.push(ValidationError {
                    field: "sync.note_extensions".into(),
                    message: format!("invalid extension '{ext}'; use e.g. 'md' without a dot"),
                });
            }
        }
        for notebook in &self.sync.notebooks {
            if notebook.is_empty() || notebook.contains('/') || notebook.contains('\\') {
                errors.push(ValidationError {
                    field: "sync.notebooks".into(),
                    message: format!("invalid notebook name '{notebook}'"),
                });
            }
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use vaultsync_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .vault_root(PathBuf::from("/home/user/Notes"))
///     .mirror_root(PathBuf::from("/home/user/Dropbox/Apps/Elephant"))
///     .sync_enabled(true)
///     .enroll("Inbox")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn vault_root(mut self, root: PathBuf) -> Self {
        self.config.vault.root = root;
        self
    }

    pub fn mirror_root(mut self, root: PathBuf) -> Self {
        self.config.mirror.root = Some(root);
        self
    }

    pub fn sync_enabled(mut self, enabled: bool) -> Self {
        self.config.sync.enabled = enabled;
        self
    }

    pub fn enroll(mut self, notebook: impl Into<String>) -> Self {
        self.config.sync.enroll(notebook);
        self
    }

    pub fn note_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.sync.note_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn sync_interval_secs(mut self, seconds: u64) -> Self {
        self.config.sync.interval_secs = seconds;
        self
    }

    pub fn export_enabled(mut self, enabled: bool) -> Self {
        self.config.export.enabled = enabled;
        self
    }

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_json(mut self, json: bool) -> Self {
        self.config.logging.json = json;
        self
    }

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
