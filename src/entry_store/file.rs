//! An JSON file-backed implementation of the [`EntryStore`][super::EntryStore] trait.
//!
//! Wraps a [`InMemoryEntryStore`][super::memory::InMemoryEntryStore] instance, persisting
//! mutations to a JSON file on disk that can be reloaded across restarts.
use crate::entry::{EntryFields, StaticDnsEntry};
use crate::entry_store::memory::InMemoryEntryStore;
use crate::entry_store::{EntryFilter, EntryStore, StorageError};
use crate::error::Error;
use std::io::ErrorKind;
use time::OffsetDateTime;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// A file-backed implementation of a static DNS entry store. After each mutation a JSON file on
/// disk is updated with the new data. This file can be reloaded across restarts to avoid losing
/// state.
///
/// Wraps a [`InMemoryEntryStore`][super::memory::InMemoryEntryStore], operating the same way
/// except for maintaining state beyond in-memory.
#[derive(Default, Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct FileEntryStore {
    entry_store: InMemoryEntryStore,
    path: String,
}

impl FileEntryStore {
    /// Save the state of the entry store as JSON to the store's configured path, or return an
    /// Error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidJSON`] if an entry in the store can't be serialized to
    /// JSON.
    ///
    /// Returns [`StorageError::IO`] if the serialized state can't be written to the backing file
    /// path.
    pub async fn save(&self) -> Result<(), StorageError> {
        let data = serde_json::to_string_pretty(&self.entry_store)?;
        let mut output_file = File::create(&self.path).await?;
        output_file.write_all(data.as_bytes()).await?;
        output_file.flush().await?;
        Ok(())
    }

    /// Load a [`FileEntryStore`] from the JSON state located at the given path, or return an
    /// Error. A missing file is created holding an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidJSON`] if the JSON state file is invalid.
    ///
    /// Returns [`StorageError::IO`] if the path can't be opened or read.
    pub async fn try_from_file(p: &str) -> Result<Self, StorageError> {
        let contents = match File::open(p).await {
            Ok(mut f) => {
                let mut buf = vec![];
                f.read_to_end(&mut buf).await?;
                buf
            }
            Err(err) => match err.kind() {
                ErrorKind::NotFound => Self::write_empty_state(File::create(&p).await?).await?,
                _ => return Err(StorageError::IO(err)),
            },
        };

        let entry_store: InMemoryEntryStore = serde_json::from_slice(&contents)?;
        tracing::debug!("loaded entry store state from {p}");
        Ok(Self {
            path: p.to_string(),
            entry_store,
        })
    }

    async fn write_empty_state(mut f: File) -> Result<Vec<u8>, StorageError> {
        let default_data = serde_json::to_string_pretty(&InMemoryEntryStore::default())?;
        let default_bytes = default_data.as_bytes();
        f.write_all(default_bytes).await?;
        f.flush().await?;
        Ok(default_bytes.to_vec())
    }
}

#[async_trait::async_trait]
impl EntryStore for FileEntryStore {
    async fn list(&self, filter: &EntryFilter) -> Vec<StaticDnsEntry> {
        self.entry_store.list(filter).await
    }

    async fn get(&self, id: u64) -> Option<StaticDnsEntry> {
        self.entry_store.get(id).await
    }

    async fn last_modified(&self) -> Option<OffsetDateTime> {
        self.entry_store.last_modified().await
    }

    async fn insert(&mut self, fields: EntryFields) -> Result<StaticDnsEntry, Error> {
        let entry = self.entry_store.insert(fields).await?;
        self.save().await?;
        Ok(entry)
    }

    async fn replace(
        &mut self,
        id: u64,
        fields: EntryFields,
        expected: OffsetDateTime,
    ) -> Result<StaticDnsEntry, Error> {
        let entry = self.entry_store.replace(id, fields, expected).await?;
        self.save().await?;
        Ok(entry)
    }

    async fn delete(&mut self, id: u64) -> Result<StaticDnsEntry, Error> {
        let entry = self.entry_store.delete(id).await?;
        self.save().await?;
        Ok(entry)
    }
}
