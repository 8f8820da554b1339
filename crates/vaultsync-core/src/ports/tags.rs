//! Tag resolver port
//!
//! Meta records store tag identifiers. The search index wants display
//! names, which live in the host's tag database.

/// Port trait for mapping tag identifiers to display names
pub trait ITagResolver: Send + Sync {
    /// Display name for `tag_id`, or `None` if the tag is unknown
    fn resolve(&self, tag_id: &str) -> Option<String>;
}

/// Resolver that treats every identifier as its own name
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTagResolver;

impl ITagResolver for IdentityTagResolver {
    fn resolve(&self, tag_id: &str) -> Option<String> {
        let name = tag_id.trim();
        (!name.is_empty()).then(|| name.to_string())
    }
}
