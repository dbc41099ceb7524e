//! Record-type-conditional validation of static DNS entries.
//!
//! Validation is a pure function of a candidate [`EntryFields`] and a
//! [`ReferenceResolver`]. It never looks at stored state.
//!
//! | type           | address must be                                  |
//! |----------------|--------------------------------------------------|
//! | `A_RECORD`     | an IPv4 literal                                  |
//! | `AAAA_RECORD`  | an IPv6 literal                                  |
//! | `CNAME_RECORD` | a DNS name, fully qualified with a trailing `.`  |
use crate::entry::{EntryFields, RecordType};
use crate::resolver::{ReferenceKind, ReferenceResolver};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use trust_dns_proto::rr::Name;

const MAX_LABEL_LEN: usize = 63;
const MAX_NAME_LEN: usize = 253;

/// The specific reason a candidate entry was rejected.
///
/// Every variant surfaces to API clients the same way, as a [`ValidationError`]. The
/// distinction exists so callers and tests can tell the failures apart.
#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
pub enum Rejection {
    #[error("'{address}' is not a valid address for a {record_type}")]
    InvalidAddress {
        record_type: RecordType,
        address: String,
    },
    #[error("CNAME_RECORD address '{0}' must end with a trailing period")]
    MissingTrailingPeriod(String),
    #[error("'{0}' is not a valid host name")]
    InvalidHost(String),
    #[error("{kind} '{name}' does not exist")]
    UnresolvedReference { kind: ReferenceKind, name: String },
}

/// Returned when a candidate static DNS entry is rejected.
#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
#[error("{reason}")]
pub struct ValidationError {
    pub reason: Rejection,
}

impl From<Rejection> for ValidationError {
    fn from(reason: Rejection) -> Self {
        Self { reason }
    }
}

/// Validate a candidate entry: host syntax, then address for the record type, then every
/// reference. The first failure is returned.
///
/// # Errors
///
/// Returns a [`ValidationError`] describing the first failed check.
pub fn validate(
    fields: &EntryFields,
    resolver: &dyn ReferenceResolver,
) -> Result<(), ValidationError> {
    if !is_dns_name(fields.host.strip_suffix('.').unwrap_or(&fields.host)) {
        return Err(Rejection::InvalidHost(fields.host.clone()).into());
    }
    validate_address(fields.record_type, &fields.address)?;

    let references = [
        (ReferenceKind::Host, &fields.host),
        (ReferenceKind::CacheGroup, &fields.cachegroup),
        (ReferenceKind::DeliveryService, &fields.deliveryservice),
    ];
    for (kind, name) in references {
        if !resolver.exists(kind, name) {
            return Err(Rejection::UnresolvedReference {
                kind,
                name: name.clone(),
            }
            .into());
        }
    }
    Ok(())
}

/// Check `address` against the format required by `record_type`.
///
/// # Errors
///
/// Returns [`Rejection::InvalidAddress`] when the address can't be used for the record type at
/// all, and [`Rejection::MissingTrailingPeriod`] for a CNAME target that is a valid but
/// unqualified name.
pub fn validate_address(record_type: RecordType, address: &str) -> Result<(), Rejection> {
    let valid = match record_type {
        RecordType::A => Ipv4Addr::from_str(address).is_ok(),
        RecordType::Aaaa => Ipv6Addr::from_str(address).is_ok(),
        RecordType::Cname => return validate_cname_target(address),
    };
    if valid {
        Ok(())
    } else {
        Err(invalid_address(record_type, address))
    }
}

fn validate_cname_target(address: &str) -> Result<(), Rejection> {
    let (name, qualified) = match address.strip_suffix('.') {
        Some(name) => (name, true),
        None => (address, false),
    };
    if IpAddr::from_str(name).is_ok() || !is_dns_name(name) {
        return Err(invalid_address(RecordType::Cname, address));
    }
    if !qualified {
        return Err(Rejection::MissingTrailingPeriod(address.to_string()));
    }
    match Name::from_ascii(address) {
        Ok(fqdn) if fqdn.is_fqdn() => Ok(()),
        _ => Err(invalid_address(RecordType::Cname, address)),
    }
}

fn invalid_address(record_type: RecordType, address: &str) -> Rejection {
    Rejection::InvalidAddress {
        record_type,
        address: address.to_string(),
    }
}

/// Whether `name` (without a trailing period) is a syntactically valid host name: dot separated
/// letter-digit-hyphen labels, the last of which is not purely numeric.
fn is_dns_name(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return false;
    }
    let labels: Vec<&str> = name.split('.').collect();
    let last_is_numeric = labels
        .last()
        .map_or(true, |l| l.bytes().all(|b| b.is_ascii_digit()));
    !last_is_numeric && labels.iter().all(|l| is_label(l))
}

fn is_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= MAX_LABEL_LEN
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}
