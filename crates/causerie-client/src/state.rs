//! Stores shared by the screen, the facade and the external event feeds.
//!
//! [`ClientState`] is a bundle of handles, not a lock: each store serialises
//! its own mutations and none is ever locked together with another.

use causerie_store::{ChannelStore, NotificationGate, PinStore};

/// Central application state.
#[derive(Debug, Clone, Default)]
pub struct ClientState {
    /// Channel records, fed by fetches, join results and message events.
    pub channels: ChannelStore,

    /// Pinned ("top") flags, set by explicit user action.
    pub pins: PinStore,

    /// Unread-notification badge.
    pub notifications: NotificationGate,
}

impl ClientState {
    /// Create empty stores.
    pub fn new() -> Self {
        Self::default()
    }
}
