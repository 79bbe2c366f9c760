use thiserror::Error;

/// Failures of the client record store itself.
///
/// Business outcomes (unknown client, already migrated) are not store errors;
/// the orchestrator resolves those into typed outcomes.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage medium cannot be reached or its lock was poisoned.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// An update targeted an identifier that does not exist.
    #[error("client {id} does not exist")]
    NotFound { id: i64 },

    /// A guarded update found the row changed since it was read.
    #[error("client {id} was changed by a concurrent update")]
    Conflict { id: i64 },

    #[error("cannot update a client that has no id")]
    MissingId,
}
