//! Error types for rowsync

use thiserror::Error;

use crate::row::{RowId, SyncAction};

/// Invariant and misuse errors raised by grid operations.
///
/// These indicate a caller bug (stale row id, cursor out of sync with the
/// column set, overlapping syncs) and are never retried by the grid itself.
/// Validation failures are not errors; they live on the rows as data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("Row not found: {0}")]
    RowNotFound(RowId),

    #[error("Row is marked for deletion: {0}")]
    RowDeleted(RowId),

    #[error("Illegal sync action transition: {from} -> {to}")]
    IllegalTransition { from: SyncAction, to: SyncAction },

    #[error("Field is not editable: {0}")]
    FieldNotEditable(String),

    #[error("Edit cursor out of sync: {0}")]
    CursorDesync(String),

    #[error("A sync is already in progress")]
    SyncInProgress,

    #[error("Grid is not configured for editing")]
    NotEditable,

    #[error("{0} row(s) have validation errors")]
    ValidationPending(usize),

    #[error("Cannot change the data view while edits are pending or a sync is running")]
    NavigationLocked,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for grid operations
pub type Result<T> = std::result::Result<T, GridError>;
