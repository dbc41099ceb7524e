use crate::conditional::{HttpDate, PreconditionFailure};
use crate::entry::{next_last_updated, truncate_to_second, EntryFields, StaticDnsEntry};
use crate::entry_store::{EntryFilter, EntryStore, StorageError};
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::OffsetDateTime;

#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct InMemoryEntryStore {
    next_id: u64,
    entries: BTreeMap<u64, StaticDnsEntry>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    last_deleted: Option<OffsetDateTime>,
}

impl InMemoryEntryStore {
    fn check_host_unique(&self, fields: &EntryFields, except: Option<u64>) -> Result<(), Error> {
        let clash = self.entries.values().any(|e| {
            Some(e.id) != except
                && e.fields.host == fields.host
                && e.fields.deliveryservice == fields.deliveryservice
        });
        if clash {
            return Err(StorageError::HostConflict {
                host: fields.host.clone(),
                deliveryservice: fields.deliveryservice.clone(),
            }
            .into());
        }
        Ok(())
    }

    fn latest(&self) -> Option<OffsetDateTime> {
        self.entries
            .values()
            .map(|e| e.last_updated)
            .chain(self.last_deleted)
            .max()
    }
}

#[async_trait::async_trait]
impl EntryStore for InMemoryEntryStore {
    async fn list(&self, filter: &EntryFilter) -> Vec<StaticDnsEntry> {
        let mut entries: Vec<StaticDnsEntry> = self
            .entries
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.host().cmp(b.host()).then(a.id.cmp(&b.id)));
        entries
    }

    async fn get(&self, id: u64) -> Option<StaticDnsEntry> {
        self.entries.get(&id).cloned()
    }

    async fn last_modified(&self) -> Option<OffsetDateTime> {
        self.latest()
    }

    async fn insert(&mut self, fields: EntryFields) -> Result<StaticDnsEntry, Error> {
        self.check_host_unique(&fields, None)?;
        self.next_id += 1;
        let entry = StaticDnsEntry {
            id: self.next_id,
            fields,
            last_updated: next_last_updated(None),
        };
        self.entries.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn replace(
        &mut self,
        id: u64,
        fields: EntryFields,
        expected: OffsetDateTime,
    ) -> Result<StaticDnsEntry, Error> {
        self.check_host_unique(&fields, Some(id))?;
        let current = self.entries.get(&id).ok_or(Error::NotFound(id))?;
        if truncate_to_second(current.last_updated) != truncate_to_second(expected) {
            return Err(PreconditionFailure::ModifiedSince {
                last_updated: HttpDate(current.last_updated),
                since: HttpDate(expected),
            }
            .into());
        }
        let entry = StaticDnsEntry {
            id,
            fields,
            last_updated: next_last_updated(Some(current.last_updated)),
        };
        self.entries.insert(id, entry.clone());
        Ok(entry)
    }

    async fn delete(&mut self, id: u64) -> Result<StaticDnsEntry, Error> {
        let entry = self.entries.remove(&id).ok_or(Error::NotFound(id))?;
        // Never behind the removed entry, so the collection's last modification can't move back.
        let deleted_at = next_last_updated(None).max(entry.last_updated);
        self.last_deleted = self.last_deleted.max(Some(deleted_at));
        Ok(entry)
    }
}
