//! VaultSync Conflict - conflict guard and result views
//!
//! Provides:
//! - Synced-timestamp conflict detection before any overwrite
//! - The follow-up view policy (Conflict before Updated before default)
//! - A use case that surfaces the chosen view through the notification port

pub mod detector;
pub mod error;
pub mod policy;
pub mod use_cases;

pub use detector::{ConflictDetector, DetectionResult, DivergentEdit};
pub use error::ConflictError;
pub use policy::ResultViewPolicy;
pub use use_cases::PresentResultsUseCase;
