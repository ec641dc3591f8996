use thiserror::Error;

/// Failures loading the user directory.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The directory file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The directory file is not a valid list of user records.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two records share a card identifier or a user id.
    #[error("Duplicate {field}: {value}")]
    Duplicate { field: &'static str, value: String },
}

pub type StorageResult<T> = Result<T, StorageError>;
