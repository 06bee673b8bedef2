use rowsync_core::GridError;
use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Controller-level errors
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Grid(#[from] GridError),

    #[error("Data load failed: {0}")]
    LoadFailed(String),

    #[error("Sync failed: {0}")]
    SyncFailed(String),
}

impl ServiceError {
    /// The underlying grid error, if this is one
    pub fn as_grid_error(&self) -> Option<&GridError> {
        match self {
            ServiceError::Grid(err) => Some(err),
            _ => None,
        }
    }
}
