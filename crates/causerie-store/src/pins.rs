//! Pinned ("top") channel flags, set by explicit user action.
//!
//! Pins live independently of channel records: leaving a channel does not
//! clear its pin, and a pin may exist for a channel that was never fetched.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use causerie_shared::ChannelId;

#[derive(Debug, Clone, Default)]
pub struct PinSnapshot {
    version: u64,
    pins: Arc<HashMap<ChannelId, bool>>,
}

impl PinSnapshot {
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Missing entries count as unpinned.
    pub fn is_pinned(&self, id: &ChannelId) -> bool {
        self.pins.get(id).copied().unwrap_or(false)
    }

    pub fn pins(&self) -> &HashMap<ChannelId, bool> {
        &self.pins
    }
}

/// Single-writer owner of pin flags.
#[derive(Debug, Clone)]
pub struct PinStore {
    cell: Arc<watch::Sender<PinSnapshot>>,
}

impl PinStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(PinSnapshot::default());
        Self { cell: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> PinSnapshot {
        self.cell.borrow().clone()
    }

    pub fn version(&self) -> u64 {
        self.cell.borrow().version
    }

    pub fn subscribe(&self) -> watch::Receiver<PinSnapshot> {
        self.cell.subscribe()
    }

    pub fn is_pinned(&self, id: &ChannelId) -> bool {
        self.cell.borrow().is_pinned(id)
    }

    /// Set the pin flag for a channel.
    pub fn set_pinned(&self, id: &ChannelId, pinned: bool) {
        self.cell.send_modify(|s| {
            Arc::make_mut(&mut s.pins).insert(id.clone(), pinned);
            s.version += 1;
        });
        debug!(channel_id = %id, pinned, "Pin updated");
    }

    /// Flip the pin flag and return the new value.
    pub fn toggle(&self, id: &ChannelId) -> bool {
        let mut pinned = false;
        self.cell.send_modify(|s| {
            pinned = !s.is_pinned(id);
            Arc::make_mut(&mut s.pins).insert(id.clone(), pinned);
            s.version += 1;
        });
        debug!(channel_id = %id, pinned, "Pin toggled");
        pinned
    }
}

impl Default for PinStore {
    fn default() -> Self {
        Self::new()
    }
}
