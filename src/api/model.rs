use crate::entry::{RecordType, StaticDnsEntry};
use crate::entry_store::EntryFilter;
use serde::{Deserialize, Serialize};

/// Query parameters accepted when listing entries: exact-match filters plus paging.
#[derive(Deserialize, Debug, Clone, Default)]
pub(super) struct ListParams {
    pub id: Option<u64>,
    pub host: Option<String>,
    pub address: Option<String>,
    #[serde(rename = "type")]
    pub record_type: Option<RecordType>,
    pub ttl: Option<u32>,
    pub cachegroup: Option<String>,
    pub deliveryservice: Option<String>,
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

impl ListParams {
    pub fn filter(&self) -> EntryFilter {
        EntryFilter {
            id: self.id,
            host: self.host.clone(),
            address: self.address.clone(),
            record_type: self.record_type,
            ttl: self.ttl,
            cachegroup: self.cachegroup.clone(),
            deliveryservice: self.deliveryservice.clone(),
        }
    }

    pub fn page(&self, entries: Vec<StaticDnsEntry>) -> Vec<StaticDnsEntry> {
        let page = entries.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) => page.take(limit).collect(),
            None => page.collect(),
        }
    }
}

/// Query parameters identifying the entry to update or delete.
#[derive(Deserialize, Debug, Clone, Copy)]
pub(super) struct IdParam {
    pub id: u64,
}

#[derive(Serialize, Debug, Clone, Copy, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub(super) enum AlertLevel {
    Success,
    Error,
}

#[derive(Serialize, Debug, Clone, Eq, PartialEq)]
pub(super) struct Alert {
    pub text: String,
    pub level: AlertLevel,
}

/// The response envelope: optional alerts and an optional response payload.
#[derive(Serialize, Debug, Clone)]
pub(super) struct Envelope<T: Serialize> {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alerts: Vec<Alert>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    pub fn response(response: T) -> Self {
        Self {
            alerts: vec![],
            response: Some(response),
        }
    }

    pub fn success(text: impl Into<String>, response: T) -> Self {
        Self {
            alerts: vec![Alert {
                text: text.into(),
                level: AlertLevel::Success,
            }],
            response: Some(response),
        }
    }
}

impl Envelope<()> {
    pub fn alert(level: AlertLevel, text: impl Into<String>) -> Self {
        Self {
            alerts: vec![Alert {
                text: text.into(),
                level,
            }],
            response: None,
        }
    }
}
