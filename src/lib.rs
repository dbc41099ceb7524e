//! Static DNS
//!
//! A small HTTP service managing static DNS entries (`A`, `AAAA` and `CNAME` records pinned to a
//! host name within a CDN delivery service).
//!
//! Two pieces do the real work on every write:
//!
//! * the [validator][validate], which checks an entry's `address` against its record type and
//!   resolves the cache group and delivery service it references, and
//! * the [conditional request guard][conditional], which honours `If-Modified-Since`,
//!   `If-Unmodified-Since` and `If-Match` against the entry's `lastUpdated` time so concurrent
//!   writers can't silently overwrite each other.
//!
//! Entries are kept in an [`EntryStore`][entry_store::EntryStore], in memory or in a JSON file.
//!
#![warn(clippy::pedantic)]

pub mod api;
pub mod conditional;
pub mod config;
pub mod entry;
pub mod entry_store;
pub mod error;
pub mod resolver;
pub mod validate;

use crate::entry_store::{file, memory};
pub use api::new as new_http;
pub use config::{Config, Shared};
pub use entry::{EntryFields, RecordType, StaticDnsEntry};
pub use file::FileEntryStore;
pub use memory::InMemoryEntryStore;
