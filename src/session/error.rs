//! Error types for channel session management.

use crate::endpoint::Target;

use super::SessionId;

/// Indicates that a channel session could not provide a connection.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The session was explicitly closed and can no longer connect.
    #[error("channel session {session_id} is closed")]
    Closed { session_id: SessionId },

    /// Opening the plaintext channel to the target failed.
    #[error("failed to connect to {target}")]
    Connect {
        target: Target,
        #[source]
        source: tonic::transport::Error,
    },
}
