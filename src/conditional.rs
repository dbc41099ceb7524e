//! HTTP conditional-request evaluation.
//!
//! Each request's precondition headers are parsed into [`Preconditions`] and evaluated against
//! the stored representation's `lastUpdated` time. Evaluation ends in one of three
//! [`Outcome`]s:
//!
//! * [`Outcome::Proceed`]: the request may be served (reads) or applied (writes).
//! * [`Outcome::NotModified`]: a read whose `If-Modified-Since` is not older than the resource.
//! * [`Outcome::PreconditionFailed`]: a write whose `If-Match` or `If-Unmodified-Since` header
//!   doesn't hold for the current resource.
//!
//! Timestamps are compared at the one second granularity of HTTP dates. Entity tags are derived
//! deterministically from the same second-truncated timestamp, see [`ETag::for_last_updated`].
use crate::entry::truncate_to_second;
use axum::http::header::{IF_MATCH, IF_MODIFIED_SINCE, IF_UNMODIFIED_SINCE};
use axum::http::{HeaderMap, HeaderName};
use lazy_static::lazy_static;
use std::fmt;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};

lazy_static! {
    // RFC 1123 without the zone, which is always GMT (or UTC, as some clients write it).
    static ref HTTP_DATE_FORMAT: &'static [time::format_description::FormatItem<'static>] =
        format_description!(
            "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second]"
        );
}

/// Format a timestamp as an RFC 1123 HTTP date, e.g. `Mon, 19 Oct 2026 10:00:00 GMT`.
///
/// Returns `None` for timestamps HTTP dates can't express (years outside `0..=9999`).
pub fn format_http_date(t: OffsetDateTime) -> Option<String> {
    let formatted = t.to_offset(UtcOffset::UTC).format(*HTTP_DATE_FORMAT).ok()?;
    Some(format!("{formatted} GMT"))
}

/// Parse an RFC 1123 HTTP date in the `GMT` or `UTC` zone.
pub fn parse_http_date(value: &str) -> Option<OffsetDateTime> {
    let value = value.trim();
    let without_zone = value
        .strip_suffix(" GMT")
        .or_else(|| value.strip_suffix(" UTC"))?;
    PrimitiveDateTime::parse(without_zone, *HTTP_DATE_FORMAT)
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

/// A timestamp that displays as an HTTP date.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct HttpDate(pub OffsetDateTime);

impl fmt::Display for HttpDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match format_http_date(self.0) {
            Some(date) => f.write_str(&date),
            None => write!(f, "{}", self.0),
        }
    }
}

/// The `Last-Modified` time to advertise for a collection whose newest change is `latest`, as
/// observed at `now`.
///
/// Changes later in the second that is still in progress would carry the same HTTP date, so a
/// client revalidating with it could miss them. Until that second has passed the second before it
/// is advertised instead, which makes the next `If-Modified-Since` read answer in full.
pub fn advertised_last_modified(latest: OffsetDateTime, now: OffsetDateTime) -> OffsetDateTime {
    let latest = truncate_to_second(latest);
    if latest < truncate_to_second(now) {
        latest
    } else {
        latest - Duration::SECOND
    }
}

/// A strong entity tag, stored with its surrounding quotes.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct ETag(String);

impl ETag {
    /// The tag for a resource last updated at `last_updated`: `"v1-"` followed by the base 36
    /// encoding of the second-truncated timestamp in unix nanoseconds.
    pub fn for_last_updated(last_updated: OffsetDateTime) -> Self {
        let nanos = truncate_to_second(last_updated).unix_timestamp_nanos();
        Self(format!("\"v1-{}\"", base36(nanos)))
    }

    /// Parse a single entity tag as sent by a client. Weak tags compare by their opaque part.
    fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let value = value.strip_prefix("W/").unwrap_or(value);
        if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
            Some(Self(value.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn base36(n: i128) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut rest = n.unsigned_abs();
    let mut out = Vec::new();
    while rest > 0 {
        #[allow(clippy::cast_possible_truncation)]
        let digit = (rest % 36) as usize;
        out.push(DIGITS[digit]);
        rest /= 36;
    }
    if n < 0 {
        out.push(b'-');
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// The value of an `If-Match` header.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum IfMatch {
    /// `*`, satisfied by any existing representation.
    Any,
    Tags(Vec<ETag>),
}

impl IfMatch {
    /// Parse a header value. Malformed tags are dropped, so a value without any valid tag
    /// becomes an empty list that no representation matches.
    fn parse(value: &str) -> Self {
        if value.trim() == "*" {
            return IfMatch::Any;
        }
        IfMatch::Tags(value.split(',').filter_map(ETag::parse).collect())
    }

    fn matches(&self, current: &ETag) -> bool {
        match self {
            IfMatch::Any => true,
            IfMatch::Tags(tags) => tags.contains(current),
        }
    }
}

/// Whether a request only reads the resource or intends to modify it.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Access {
    Read,
    Write,
}

/// The precondition headers of one request.
///
/// Date headers whose values can't be parsed are ignored, as if absent. An `If-Match` header
/// is never ignored: without a valid tag it matches nothing.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Preconditions {
    pub if_modified_since: Option<OffsetDateTime>,
    pub if_unmodified_since: Option<OffsetDateTime>,
    pub if_match: Option<IfMatch>,
}

/// Why a write precondition failed.
#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
pub enum PreconditionFailure {
    #[error("resource does not match the If-Match entity tag, current tag is {current}")]
    ETagMismatch { current: ETag },
    #[error("resource was modified at {last_updated}, after the If-Unmodified-Since time {since}")]
    ModifiedSince {
        last_updated: HttpDate,
        since: HttpDate,
    },
}

/// The terminal state of a conditional-request evaluation.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Outcome {
    Proceed,
    NotModified { since: OffsetDateTime },
    PreconditionFailed(PreconditionFailure),
}

impl Preconditions {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let text = |name: &HeaderName| headers.get(name).and_then(|v| v.to_str().ok());
        let date = |name: &HeaderName| {
            let value = text(name)?;
            let parsed = parse_http_date(value);
            if parsed.is_none() {
                tracing::debug!("ignoring unparseable {name} header \"{value}\"");
            }
            parsed
        };
        Self {
            if_modified_since: date(&IF_MODIFIED_SINCE),
            if_unmodified_since: date(&IF_UNMODIFIED_SINCE),
            if_match: headers.get(IF_MATCH).map(|value| {
                let if_match = value.to_str().map_or(IfMatch::Tags(vec![]), IfMatch::parse);
                if if_match == IfMatch::Tags(vec![]) {
                    tracing::debug!("{IF_MATCH} header {value:?} has no valid entity tag");
                }
                if_match
            }),
        }
    }

    /// Evaluate these preconditions for a request with the given `access` against a resource
    /// last updated at `last_updated`. `None` means there is no stored timestamp to compare
    /// against (e.g. an empty collection), in which case only `If-Match` can fail.
    ///
    /// For writes every applicable header is evaluated. `If-Match` is checked first and the
    /// first failure is the one reported.
    pub fn evaluate(&self, access: Access, last_updated: Option<OffsetDateTime>) -> Outcome {
        let last_updated = last_updated.map(truncate_to_second);
        match access {
            Access::Read => match (self.if_modified_since, last_updated) {
                (Some(since), Some(last_updated)) if last_updated <= since => {
                    Outcome::NotModified { since }
                }
                _ => Outcome::Proceed,
            },
            Access::Write => {
                if let Some(failure) = self.check_if_match(last_updated) {
                    return Outcome::PreconditionFailed(failure);
                }
                if let Some(failure) = self.check_if_unmodified_since(last_updated) {
                    return Outcome::PreconditionFailed(failure);
                }
                Outcome::Proceed
            }
        }
    }

    fn check_if_match(&self, last_updated: Option<OffsetDateTime>) -> Option<PreconditionFailure> {
        let if_match = self.if_match.as_ref()?;
        let current = match last_updated {
            Some(t) => ETag::for_last_updated(t),
            None => ETag(String::new()),
        };
        if last_updated.is_some() && if_match.matches(&current) {
            None
        } else {
            Some(PreconditionFailure::ETagMismatch { current })
        }
    }

    fn check_if_unmodified_since(
        &self,
        last_updated: Option<OffsetDateTime>,
    ) -> Option<PreconditionFailure> {
        match (self.if_unmodified_since, last_updated) {
            (Some(since), Some(last_updated)) if last_updated > since => {
                Some(PreconditionFailure::ModifiedSince {
                    last_updated: HttpDate(last_updated),
                    since: HttpDate(since),
                })
            }
            _ => None,
        }
    }
}
