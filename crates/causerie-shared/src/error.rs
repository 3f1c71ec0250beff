use thiserror::Error;

use crate::types::ChannelId;

/// Errors surfaced by the channel-list engine to its callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CauserieError {
    /// A store invariant was violated (e.g. an id in the joined list has no
    /// record). Indicates a defect, never user-recoverable.
    #[error("Inconsistent state: {0}")]
    InconsistentState(String),

    /// A page fetch is already in flight.
    #[error("A channel fetch is already in progress")]
    FetchInProgress,

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The owning screen was disposed before the result arrived.
    #[error("Screen disposed, result discarded")]
    ScreenDisposed,
}

impl CauserieError {
    pub fn missing_channel(id: &ChannelId) -> Self {
        Self::InconsistentState(format!("no record for channel {id}"))
    }

    /// Whether the UI may recover from this error (retry, ignore, show a toast).
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InconsistentState(_))
    }
}

/// Failures reported by the network collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Network failure: {0}")]
    Network(String),

    #[error("Request rejected by server: {0}")]
    Rejected(String),

    #[error("Request timed out")]
    Timeout,
}
