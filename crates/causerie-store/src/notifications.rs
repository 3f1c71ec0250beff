//! Unread-notification badge state.
//!
//! The gate remembers the payload of the latest push (the "marker") and how
//! many times the user has acknowledged the badge by opening the
//! notifications screen.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use crate::models::NotificationState;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSnapshot {
    pub version: u64,
    /// Payload of the latest unacknowledged push.
    pub marker: Option<String>,
    /// Number of times the badge was cleared.
    pub acknowledged: u64,
}

impl NotificationSnapshot {
    pub fn state(&self) -> NotificationState {
        NotificationState {
            has_unread: self.marker.is_some(),
        }
    }
}

/// Single-writer owner of the unread-notification marker.
#[derive(Debug, Clone)]
pub struct NotificationGate {
    cell: Arc<watch::Sender<NotificationSnapshot>>,
}

impl NotificationGate {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(NotificationSnapshot::default());
        Self { cell: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> NotificationSnapshot {
        self.cell.borrow().clone()
    }

    pub fn state(&self) -> NotificationState {
        self.cell.borrow().state()
    }

    pub fn subscribe(&self) -> watch::Receiver<NotificationSnapshot> {
        self.cell.subscribe()
    }

    /// A push arrived.  Only a non-null payload raises the badge; returns
    /// whether the gate changed.
    pub fn on_push(&self, payload: Option<String>) -> bool {
        let Some(payload) = payload else {
            debug!("Ignoring notification push without payload");
            return false;
        };
        self.cell.send_if_modified(|s| {
            if s.marker.as_deref() == Some(payload.as_str()) {
                return false;
            }
            s.marker = Some(payload);
            s.version += 1;
            true
        })
    }

    /// The user opened the notifications screen.
    pub fn acknowledge(&self) {
        self.cell.send_modify(|s| {
            s.marker = None;
            s.acknowledged += 1;
            s.version += 1;
        });
        debug!("Notifications acknowledged");
    }
}

impl Default for NotificationGate {
    fn default() -> Self {
        Self::new()
    }
}
