use crate::entry_store::{DynEntryStore, FileEntryStore, InMemoryEntryStore};
use crate::error::Error;
use crate::resolver::{ReferenceKind, ReferenceResolver};
use serde::Deserialize;
use serde_with::{serde_as, DurationSeconds};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

pub type Shared = Arc<Config>;

#[serde_as]
#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub api_bind_addr: SocketAddr,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub api_timeout: Duration,
    /// Where the [`FileEntryStore`] keeps its state. Entries are kept in memory only when unset.
    #[serde(default)]
    pub store_state_path: Option<String>,
    /// Names of the cache groups entries may reference.
    pub cache_groups: HashSet<String>,
    /// Names of the delivery services entries may belong to.
    pub delivery_services: HashSet<String>,
    /// Host names entries may use. Any syntactically valid host is allowed when unset.
    #[serde(default)]
    pub hosts: Option<HashSet<String>>,
}

impl Config {
    pub fn try_from_file(p: impl AsRef<Path>) -> Result<Self, Error> {
        let f = File::open(p)?;
        let reader = BufReader::new(f);
        let conf: Config = serde_json::from_reader(reader)?;
        Ok(conf)
    }

    /// Open the entry store this config describes.
    pub async fn entry_store(&self) -> Result<DynEntryStore, Error> {
        let entry_store: DynEntryStore = match &self.store_state_path {
            Some(path) => {
                tracing::info!("persisting static DNS entries to {path}");
                Arc::new(RwLock::new(FileEntryStore::try_from_file(path).await?))
            }
            None => {
                tracing::warn!("no store_state_path configured, static DNS entries are not durable");
                Arc::new(RwLock::new(InMemoryEntryStore::default()))
            }
        };
        Ok(entry_store)
    }
}

impl ReferenceResolver for Config {
    fn exists(&self, kind: ReferenceKind, name: &str) -> bool {
        match kind {
            ReferenceKind::Host => self.hosts.as_ref().map_or(true, |h| h.contains(name)),
            ReferenceKind::CacheGroup => self.cache_groups.contains(name),
            ReferenceKind::DeliveryService => self.delivery_services.contains(name),
        }
    }
}
