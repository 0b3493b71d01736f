//! Extraction error types

use thiserror::Error;

/// Errors surfaced by the extraction session.
///
/// Per-record failures inside an extraction pass are logged and skipped,
/// never raised; these errors cover the session lifecycle and the primary
/// database entry only.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// A pass was invoked before the database was loaded
    #[error("database not loaded; call load_database first")]
    NotReady,

    /// The archive carries no database entry
    #[error("no database entry found in the archive (tried {0})")]
    DatabaseMissing(String),

    /// Archive-level failure
    #[error(transparent)]
    Archive(#[from] starforge_p4k::P4kError),

    /// Database decode failure
    #[error(transparent)]
    Forge(#[from] starforge_forge::ForgeError),

    /// The row sink rejected a batch
    #[error("sink failure on table {table}: {message}")]
    Sink {
        /// Destination table
        table: String,
        /// Sink-reported failure
        message: String,
    },
}

/// Result type for extraction operations
pub type ExtractResult<T> = Result<T, ExtractError>;
