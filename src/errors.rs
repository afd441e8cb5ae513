//! # Store Error Types Module
//!
//! Error types surfaced by the tag store and the tag index. A missing tag is
//! never an error here; `NotFound` is modelled as `Option::None` by the store.

/// Failures of the underlying tag store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The database transaction could not be completed
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// A stored entry could not be decoded
    #[error("corrupt entry for tag {tag:?}: {reason}")]
    CorruptEntry { tag: String, reason: String },
    /// An entry could not be encoded for writing
    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl StoreError {
    /// Short label of the failure kind, used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::Database(_) => "database",
            StoreError::CorruptEntry { .. } => "corrupt_entry",
            StoreError::Encoding(_) => "encoding",
        }
    }
}
