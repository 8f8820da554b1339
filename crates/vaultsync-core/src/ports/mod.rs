//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the sync engine
//! depends on, but whose implementations live with the host.
//!
//! ## Ports Overview
//!
//! - [`INotificationService`] - Vault change notifications and result views
//! - [`IMirrorLocator`] - Where the remote mirror folder lives
//! - [`ITagResolver`] - Tag identifiers to display names

pub mod mirror;
pub mod notification;
pub mod tags;

pub use mirror::{ConfiguredMirrorLocator, IMirrorLocator};
pub use notification::{INotificationService, ResultView, VaultNotification};
pub use tags::{ITagResolver, IdentityTagResolver};
