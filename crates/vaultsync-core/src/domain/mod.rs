//! Domain entities and business logic
//!
//! This module contains the core domain types for VaultSync:
//! - Newtypes for validated note identities and content hashes
//! - Replica layout (where each kind of file lives on a side)
//! - Note meta documents and the `synced` timestamp
//! - Sync and action-log action kinds
//! - Mobile event commands
//! - Pass results and transient result sets
//! - Domain-specific error types

pub mod action;
pub mod errors;
pub mod event;
pub mod meta;
pub mod newtypes;
pub mod replica;
pub mod result;
pub mod result_set;

// Re-export commonly used types
pub use action::{ActionEntry, ActionKind, Side, SyncAction};
pub use errors::DomainError;
pub use event::{MoveEvent, SyncEvent};
pub use meta::NoteMeta;
pub use newtypes::*;
pub use replica::Replica;
pub use result::{PassState, SyncBlocked, SyncResult};
pub use result_set::{ResultSet, ResultSetKind};
