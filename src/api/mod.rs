//! HTTP API for managing static DNS entries.
//!
//! Successful responses wrap their payload as `{"response": ...}`, optionally with an `alerts`
//! list. Failures return the HTTP status for the error and a body of the form:
//!
//! ```json
//! { "alerts": [ { "text": "'cdn.test.com' ...", "level": "error" } ] }
//! ```
//!
//! # API Endpoints
//!
//! ## `/healthcheck` (GET)
//!
//!   Returns HTTP 200 (OK) and the JSON body `{"ok":"healthy"}` when the service is operational.
//!
//! ## `/api/4.0/staticdnsentries` (GET)
//!
//!   Lists entries in ascending `host` order. The query parameters `id`, `host`, `address`,
//!   `type`, `ttl`, `cachegroup` and `deliveryservice` filter by exact match, `limit` and
//!   `offset` page through the results.
//!
//!   Responses carry a `Last-Modified` header holding the time of the most recent change to any
//!   entry. A request with an `If-Modified-Since` header no older than that time gets HTTP 304
//!   (Not Modified) with no body.
//!
//! ## `/api/4.0/staticdnsentries` (POST)
//!
//!   Creates an entry from a JSON request body of the form:
//!
//!   ```json
//!   {
//!     "host": "host2",
//!     "address": "192.168.0.2",
//!     "type": "A_RECORD",
//!     "ttl": 10,
//!     "cachegroup": "cachegroup2",
//!     "deliveryservice": "ds2"
//!   }
//!   ```
//!
//!   The `address` must suit the `type`: an IPv4 address for `A_RECORD`, an IPv6 address for
//!   `AAAA_RECORD`, and a fully qualified name with a trailing period for `CNAME_RECORD`. The
//!   `cachegroup` and `deliveryservice` must be known to the [configuration][crate::Config].
//!   Invalid entries get HTTP 400 (Bad Request).
//!
//!   Returns HTTP 201 (Created) with the stored entry, including its assigned `id` and
//!   `lastUpdated` time, plus `ETag` and `Last-Modified` headers.
//!
//! ## `/api/4.0/staticdnsentries?id=N` (PUT)
//!
//!   Replaces entry `N` with the JSON request body, validated as for creation. The request may be
//!   made conditional with:
//!
//!   * `If-Match`: the `ETag` of the version being replaced (or `*`).
//!   * `If-Unmodified-Since`: an HTTP date no older than the entry's `lastUpdated`.
//!
//!   When either doesn't hold, the update is refused with HTTP 412 (Precondition Failed).
//!   Unknown ids get HTTP 404 (Not Found). Otherwise returns HTTP 200 (OK) with the updated
//!   entry and its new `ETag` and `Last-Modified` headers.
//!
//! ## `/api/4.0/staticdnsentries?id=N` (DELETE)
//!
//!   Deletes entry `N`. Deleting an entry that doesn't exist, including one that was already
//!   deleted, gets HTTP 404 (Not Found).

mod api_error;
mod model;
mod routes;
pub mod server;

pub use server::{new, router, AppState};
