use thiserror::Error;

use crate::shared::AppError;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Pool {0} not found")]
    PoolNotFound(String),

    #[error("Pool is already closed")]
    AlreadyClosed,

    #[error("Pool is not closed")]
    NotClosed,

    #[error("Results incomplete: {missing} of {total} matches have no final score")]
    ResultsIncomplete { missing: usize, total: usize },

    #[error("Closed pools must be reopened before deletion")]
    DeleteClosed,

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::PoolNotFound(id) => AppError::NotFound(format!("Pool {id} not found")),
            LifecycleError::AlreadyClosed
            | LifecycleError::NotClosed
            | LifecycleError::DeleteClosed => AppError::Conflict(err.to_string()),
            LifecycleError::ResultsIncomplete { .. } => AppError::Validation(err.to_string()),
            LifecycleError::Store(inner) => inner,
        }
    }
}
