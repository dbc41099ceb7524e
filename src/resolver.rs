//! Existence checks for the entities a static DNS entry refers to.

use std::fmt;
use std::sync::Arc;

/// The kinds of entity a static DNS entry references by name.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ReferenceKind {
    Host,
    CacheGroup,
    DeliveryService,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReferenceKind::Host => "host",
            ReferenceKind::CacheGroup => "cachegroup",
            ReferenceKind::DeliveryService => "deliveryservice",
        })
    }
}

/// `DynResolver` is a type alias for a [`ReferenceResolver`] shared between request handlers.
#[allow(clippy::module_name_repetitions)]
pub type DynResolver = Arc<dyn ReferenceResolver + Send + Sync>;

/// Answers whether a named entity of the given kind exists. The
/// [validator][crate::validate] consults it for every reference an entry makes, but the
/// resolver itself knows nothing about DNS entries.
///
/// [`Config`][crate::config::Config] implements this trait from its configured lists of known
/// cache groups, delivery services and hosts.
pub trait ReferenceResolver {
    fn exists(&self, kind: ReferenceKind, name: &str) -> bool;
}
