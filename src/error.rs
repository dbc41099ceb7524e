//! Error types.

use crate::conditional::PreconditionFailure;
use crate::entry_store::StorageError;
use crate::validate::ValidationError;

/// Error enumerates the possible Static DNS error states.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Returned when a candidate entry fails [validation][crate::validate]. The wrapped error
    /// carries the specific [`Rejection`][crate::validate::Rejection].
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Returned when a write's `If-Match` or `If-Unmodified-Since` precondition doesn't hold,
    /// either when the [guard][crate::conditional] evaluates the request headers or when the
    /// store finds the entry changed underneath the write.
    #[error("precondition failed: {0}")]
    PreconditionFailed(#[from] PreconditionFailure),

    /// Returned when no entry exists with the given id.
    #[error("no static DNS entry exists with id {0}")]
    NotFound(u64),

    /// Returned when the [`EntryStore`][crate::entry_store::EntryStore] fails. Never retried.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Returned when a generic IO error occurs.
    #[error("an IO error occurred")]
    IO(#[from] std::io::Error),

    /// Returned when [loading a `Config`][crate::config::Config::try_from_file] fails due to
    /// invalid JSON content.
    #[error("invalid JSON")]
    InvalidJSON(#[from] serde_json::Error),
}
