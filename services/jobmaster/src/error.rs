//! Error types for the partition tracker and its collaborators.

use thiserror::Error;

/// Failure reported by a remote collaborator (worker, shuffle master or
/// resource manager).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The endpoint could not be reached.
    #[error("endpoint unreachable: {0}")]
    Unreachable(String),

    /// The endpoint answered but refused the request.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// Internal error on the remote side.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors surfaced to callers of the partition tracker.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// A cluster partition lookup was made before any resource manager was bound.
    #[error("not connected to a resource manager")]
    NotConnected,

    /// The bound resource manager failed to answer a lookup.
    #[error("resource manager request failed: {0}")]
    ResourceManager(#[source] GatewayError),
}

impl TrackerError {
    /// Returns true if this error is the missing resource manager binding.
    pub fn is_not_connected(&self) -> bool {
        matches!(self, TrackerError::NotConnected)
    }
}
