use schooldesk_core::{AuthError, StoreError};
use thiserror::Error;

/// Failure of a store operation, as surfaced to the caller.
#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("failed to {operation} {collection}: {source}")]
    RemoteWrite {
        collection: &'static str,
        operation: &'static str,
        #[source]
        source: StoreError,
    },
    #[error("subscription to {collection} failed: {source}")]
    Subscription {
        collection: &'static str,
        #[source]
        source: StoreError,
    },
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl AppError {
    pub fn missing_id(collection: &str) -> Self {
        AppError::Validation(format!("{} id is required", collection))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }
}
