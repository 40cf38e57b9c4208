//! Error types shared by the persistence backends.

use thiserror::Error;

/// Failure of a single table or blob request. Every variant renders as a
/// message that can be shown to the admin as-is.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Could not reach the backend: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered but refused the request (policy, constraint,
    /// malformed filter).
    #[error("{message} (status {status})")]
    Rejected { status: u16, message: String },

    #[error("No matching record in {table}.")]
    NotFound { table: String },

    #[error("Expected one record in {table} but found several.")]
    MultipleRows { table: String },

    #[error("Unexpected data from the backend: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Local database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Local file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Local store unavailable: {0}")]
    Poisoned(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}
