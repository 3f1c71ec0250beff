use causerie_shared::{CauserieError, ChannelId};
use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A mutation referenced a channel that has no record.
    #[error("Unknown channel: {0}")]
    UnknownChannel(ChannelId),
}

impl From<StoreError> for CauserieError {
    fn from(e: StoreError) -> Self {
        CauserieError::InconsistentState(e.to_string())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
