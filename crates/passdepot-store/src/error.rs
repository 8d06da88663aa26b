//! Error taxonomy for the versioned entity store.
//!
//! All of these are local, synchronous, surfaced to the immediate caller;
//! the store never retries internally.

use passdepot_core::db::DatabaseError;
use thiserror::Error;

/// Errors raised by the store layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A by-identity lookup matched zero rows.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A by-identity lookup matched more than one row. UUID collisions are
    /// a data-integrity fault and are surfaced, not swallowed.
    #[error("Ambiguous result: more than one row for {0}")]
    Ambiguous(String),

    /// A caller tried to filter on a disallowed column.
    #[error("Forbidden field in query: {0}")]
    ForbiddenField(String),

    /// A caller supplied an operator outside the allowed set, or an
    /// otherwise malformed filter.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// An update or hard delete was attempted on an entity that was never
    /// persisted.
    #[error("Entity has no identity assigned")]
    MissingIdentity,

    /// An attempt to attach a revision to a model it does not belong to.
    #[error("Revision {revision} does not belong to model {model}")]
    RevisionMismatch { model: String, revision: String },

    /// A lifecycle listener failed; the fault propagates to the caller.
    #[error("Listener error: {0}")]
    Listener(String),

    /// Underlying database failure.
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(DatabaseError::from(e))
    }
}
