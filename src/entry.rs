//! The Static DNS Entry data model.

use serde::{Deserialize, Serialize};
use std::fmt;
use time::{Duration, OffsetDateTime};

/// The DNS resource record types a static entry may hold.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Hash, Ord, PartialOrd, Eq, PartialEq)]
pub enum RecordType {
    #[serde(rename = "A_RECORD")]
    A,
    #[serde(rename = "AAAA_RECORD")]
    Aaaa,
    #[serde(rename = "CNAME_RECORD")]
    Cname,
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecordType::A => "A_RECORD",
            RecordType::Aaaa => "AAAA_RECORD",
            RecordType::Cname => "CNAME_RECORD",
        })
    }
}

/// The client-controlled fields of a static DNS entry. Used both as the candidate record given
/// to the [validator][crate::validate] and as the input to
/// [`EntryStore`][crate::entry_store::EntryStore] mutations.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct EntryFields {
    pub host: String,
    pub address: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub ttl: u32,
    pub cachegroup: String,
    pub deliveryservice: String,
}

/// A persisted static DNS entry.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StaticDnsEntry {
    pub id: u64,
    #[serde(flatten)]
    pub fields: EntryFields,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
}

impl StaticDnsEntry {
    pub fn host(&self) -> &str {
        &self.fields.host
    }
}

/// Truncate a timestamp to whole seconds, the granularity of HTTP dates.
pub fn truncate_to_second(t: OffsetDateTime) -> OffsetDateTime {
    t - Duration::nanoseconds(i64::from(t.nanosecond()))
}

/// Compute the `lastUpdated` value for a change to an entry last updated at `previous`, or for a
/// new entry when `previous` is `None`.
///
/// The result is the current time truncated to whole seconds, bumped to one second past
/// `previous` when the clock hasn't yet moved on. Each entry's timestamp (and ETag) therefore
/// strictly advances even when it is written twice in the same second.
pub fn next_last_updated(previous: Option<OffsetDateTime>) -> OffsetDateTime {
    let now = truncate_to_second(OffsetDateTime::now_utc());
    match previous.map(truncate_to_second) {
        Some(prev) if prev >= now => prev + Duration::SECOND,
        _ => now,
    }
}
