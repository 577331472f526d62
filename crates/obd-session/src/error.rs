//! Transport Error Types

use thiserror::Error;

/// Errors surfaced by the transport collaborator.
///
/// None of these are fatal to the client: discovery failures are absorbed
/// by the connect-time fallback, and a write failure costs one command.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// No compatible adapter channel could be found
    #[error("no compatible adapter transport found")]
    Unavailable,

    /// Device reachable but no OBD-II service matched the filter
    #[error("no compatible OBD-II service found")]
    NoServiceFound,

    /// Service present but no notify/write characteristic matched
    #[error("no notify/write characteristic found")]
    NoCharacteristicFound,

    /// A command write was rejected by the channel
    #[error("command write rejected: {0}")]
    Write(String),

    /// The channel was closed underneath the session
    #[error("transport closed")]
    Closed,
}

impl TransportError {
    /// Discovery-stage failures are all handled the same way: fall back
    /// to synthetic telemetry.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            TransportError::Unavailable
                | TransportError::NoServiceFound
                | TransportError::NoCharacteristicFound
        )
    }
}
