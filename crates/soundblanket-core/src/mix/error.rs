//! Mix repository error types

use thiserror::Error;

use crate::store::StoreError;

/// Input rejected before anything is written
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Mix name must not be empty")]
    EmptyName,

    #[error("No sounds are playing, nothing to save")]
    NothingToSave,
}

/// Errors returned by [`super::MixRepository`]
#[derive(Error, Debug)]
pub enum MixError {
    #[error("Invalid mix: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// A stored value exists but does not parse
    #[error("Corrupt entry under {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type MixResult<T> = Result<T, MixError>;
