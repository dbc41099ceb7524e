//! Static DNS entry storage.
//!
//! Supports a generic interface for listing, creating, replacing and deleting
//! [`StaticDnsEntry`] values. The store owns id assignment and `lastUpdated` timestamps, and
//! enforces that a host is unique within its delivery service.
//!
//! Two implementations are provided, [`memory::InMemoryEntryStore`] and
//! [`file::FileEntryStore`]. The former is not durable across restarts. The latter will write its
//! state to disk for each mutation and load this state again on startup.

use crate::entry::{EntryFields, RecordType, StaticDnsEntry};
use crate::error::Error;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::RwLock;

pub mod file;
pub mod memory;

#[allow(clippy::module_name_repetitions)]
pub use file::FileEntryStore;
#[allow(clippy::module_name_repetitions)]
pub use memory::InMemoryEntryStore;

/// `DynEntryStore` is a type alias for an [`EntryStore`] that can be used by multiple read/write
/// consumers that coordinate through an [`Arc`] and a [`RwLock`] wrapping the [`EntryStore`].
#[allow(clippy::module_name_repetitions)]
pub type DynEntryStore = Arc<RwLock<dyn EntryStore + Send + Sync>>;

/// Failures of the storage layer itself. These are passed to clients unmodified and are
/// always fatal to the current request.
#[derive(thiserror::Error, Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum StorageError {
    /// Returned when a mutation would give a delivery service two entries for the same host.
    #[error("a static DNS entry for host \"{host}\" already exists in delivery service \"{deliveryservice}\"")]
    HostConflict {
        host: String,
        deliveryservice: String,
    },

    /// Returned when the store state can't be read from or written to disk.
    #[error("an IO error occurred in the entry store")]
    IO(#[from] std::io::Error),

    /// Returned when the store state on disk isn't valid JSON, or can't be serialized.
    #[error("invalid entry store JSON")]
    InvalidJSON(#[from] serde_json::Error),
}

/// Exact-match filters applied when listing entries. Unset fields match everything.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct EntryFilter {
    pub id: Option<u64>,
    pub host: Option<String>,
    pub address: Option<String>,
    pub record_type: Option<RecordType>,
    pub ttl: Option<u32>,
    pub cachegroup: Option<String>,
    pub deliveryservice: Option<String>,
}

impl EntryFilter {
    pub fn host(host: impl Into<String>) -> Self {
        Self {
            host: Some(host.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, entry: &StaticDnsEntry) -> bool {
        let f = &entry.fields;
        self.id.map_or(true, |id| id == entry.id)
            && self.host.as_ref().map_or(true, |h| *h == f.host)
            && self.address.as_ref().map_or(true, |a| *a == f.address)
            && self.record_type.map_or(true, |t| t == f.record_type)
            && self.ttl.map_or(true, |ttl| ttl == f.ttl)
            && self.cachegroup.as_ref().map_or(true, |c| *c == f.cachegroup)
            && self
                .deliveryservice
                .as_ref()
                .map_or(true, |d| *d == f.deliveryservice)
    }
}

/// An async trait describing storage of [`StaticDnsEntry`] values.
#[async_trait::async_trait]
pub trait EntryStore {
    /// List the entries matching `filter`, in ascending `host` order (ties broken by `id`).
    async fn list(&self, filter: &EntryFilter) -> Vec<StaticDnsEntry>;

    /// Get the entry with the given id (if any).
    async fn get(&self, id: u64) -> Option<StaticDnsEntry>;

    /// The most recent time any entry was created, updated or deleted, or `None` for a store
    /// that has never been mutated.
    async fn last_modified(&self) -> Option<OffsetDateTime>;

    /// Persist a new entry, assigning its id and `lastUpdated` time.
    async fn insert(&mut self, fields: EntryFields) -> Result<StaticDnsEntry, Error>;

    /// Replace the fields of the entry with the given id, advancing its `lastUpdated` time.
    ///
    /// The replacement only happens if the entry's `lastUpdated` still equals `expected`,
    /// otherwise [`Error::PreconditionFailed`] is returned. This repeats the
    /// [conditional request][crate::conditional] check at commit time.
    async fn replace(
        &mut self,
        id: u64,
        fields: EntryFields,
        expected: OffsetDateTime,
    ) -> Result<StaticDnsEntry, Error>;

    /// Delete the entry with the given id, returning it. Returns [`Error::NotFound`] if there is
    /// no such entry, including when it was already deleted.
    async fn delete(&mut self, id: u64) -> Result<StaticDnsEntry, Error>;
}
