//! Mirror locator port
//!
//! The remote mirror is whatever folder the third-party sync client keeps
//! in step with its cloud. How that folder is found is host-specific; the
//! engine only asks for a path.

use std::path::PathBuf;

/// Port trait for finding the remote mirror root
pub trait IMirrorLocator: Send + Sync {
    /// Root of the mirror folder, or `None` when it cannot be located
    fn locate(&self) -> Option<PathBuf>;
}

/// Locator backed by a fixed, configured path
#[derive(Debug, Clone, Default)]
pub struct ConfiguredMirrorLocator {
    root: Option<PathBuf>,
}

impl ConfiguredMirrorLocator {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }
}

impl IMirrorLocator for ConfiguredMirrorLocator {
    fn locate(&self) -> Option<PathBuf> {
        self.root.clone()
    }
}
