//! Synchronization Errors

use thiserror::Error;

/// Result type for collection requests
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors produced by a collection request.
///
/// `Cancelled` is a lifecycle event and is never shown to the user.
/// `Unsaved` rejects a call before any request is made. Every other
/// variant is surfaced the same way and rolls back the optimistic change
/// that issued the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("Request canceled")]
    Cancelled,

    #[error("{0}")]
    Network(String),

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Record has not been saved yet")]
    Unsaved,
}

impl SyncError {
    /// Build a status error with the usual human readable message
    pub fn status(status: u16) -> Self {
        SyncError::Status {
            status,
            message: format!("Request failed with status code {}", status),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, SyncError::Cancelled)
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            SyncError::status(status.as_u16())
        } else if err.is_decode() {
            SyncError::Decode(err.to_string())
        } else {
            SyncError::Network(err.to_string())
        }
    }
}
