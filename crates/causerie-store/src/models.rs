//! Domain models held by the stores.
//!
//! `ChannelRecord` is also the shape the transport hands over when a page of
//! channels is fetched, so it derives `Deserialize` with camelCase fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use causerie_shared::{ChannelId, GroupId, MessageId};

// ---------------------------------------------------------------------------
// Last message
// ---------------------------------------------------------------------------

/// Pointer to the most recent message of a channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LastMessage {
    pub id: MessageId,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Join status
// ---------------------------------------------------------------------------

/// Membership of the current user in a channel.
///
/// `Joining` only exists locally between `start_join` and the join response.
/// On the wire this is the server's `joined` boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "bool", into = "bool")]
pub enum JoinStatus {
    #[default]
    NotJoined,
    Joining,
    Joined,
}

impl JoinStatus {
    pub fn is_joined(self) -> bool {
        self == Self::Joined
    }

    pub fn is_joining(self) -> bool {
        self == Self::Joining
    }
}

impl From<bool> for JoinStatus {
    fn from(joined: bool) -> Self {
        if joined {
            Self::Joined
        } else {
            Self::NotJoined
        }
    }
}

impl From<JoinStatus> for bool {
    fn from(status: JoinStatus) -> Self {
        status.is_joined()
    }
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// A chat channel as known to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRecord {
    /// Server-assigned identifier, never changes.
    pub id: ChannelId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Most recent message, if the channel has any.
    #[serde(default)]
    pub last_message: Option<LastMessage>,
    /// Whether the current user is a member.
    #[serde(rename = "joined", default)]
    pub join_status: JoinStatus,
    /// Group backing the channel, required to join it.
    #[serde(default)]
    pub group_id: GroupId,
    /// Whether the channel is listed in discovery.
    #[serde(default)]
    pub is_public: bool,
}

impl ChannelRecord {
    pub fn new(id: impl Into<ChannelId>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            last_message: None,
            join_status: JoinStatus::NotJoined,
            group_id: GroupId::default(),
            is_public: false,
        }
    }

    pub fn is_joined(&self) -> bool {
        self.join_status.is_joined()
    }

    /// Timestamp used to order channels; `None` when there is no message yet.
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.last_message.as_ref().map(|m| m.timestamp)
    }

    /// Id of the last message, skipping empty ids.
    pub fn last_message_id(&self) -> Option<&MessageId> {
        self.last_message
            .as_ref()
            .map(|m| &m.id)
            .filter(|id| !id.is_empty())
    }
}

impl From<&str> for ChannelRecord {
    fn from(id: &str) -> Self {
        Self::new(ChannelId::from(id))
    }
}

// ---------------------------------------------------------------------------
// Notification badge
// ---------------------------------------------------------------------------

/// Read model for the notification bell.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationState {
    pub has_unread: bool,
}

// ---------------------------------------------------------------------------
// Fetched page
// ---------------------------------------------------------------------------

/// One page of channels returned by the transport.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelPage {
    pub items: Vec<ChannelRecord>,
    #[serde(default)]
    pub has_more: bool,
}
