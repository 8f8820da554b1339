//! VaultSync Audit - user-facing action log
//!
//! Provides:
//! - `ActionLog`: appends `NEW`/`DEL`/`COPY`/`MOVE` lines to the vault's `.synclog`
//! - `ActionLogReader`: parses the log back into typed entries
//! - `ReasonCode`: structured codes for skipped notes and events

pub mod error;
pub mod logger;
pub mod reader;
pub mod reason;

pub use error::AuditError;
pub use logger::ActionLog;
pub use reader::{ActionLogContents, ActionLogReader};
pub use reason::ReasonCode;
