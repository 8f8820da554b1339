//! VaultSync Core - Domain types and configuration
//!
//! This crate contains the pieces every other VaultSync crate shares:
//! - **Domain types** - `NoteRef`, `NoteMeta`, `SyncAction`, `SyncEvent`, `SyncResult`
//! - **Replica layout** - where notes, meta records, attachments, retained
//!   copies and event files live on each side
//! - **Port definitions** - Traits for collaborators outside the engine:
//!   `INotificationService`, `IMirrorLocator`, `ITagResolver`
//! - **Configuration** - YAML-backed settings with validation and a builder
//!
//! The domain module performs no I/O. File-system work lives in
//! `vaultsync-sync`.

pub mod config;
pub mod domain;
pub mod ports;
