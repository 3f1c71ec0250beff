//! Interfaces of the collaborators the engine drives: the network
//! transport, the router and the notification event bus.

use std::future::Future;

use causerie_shared::constants::{
    ROUTE_CHANNEL, ROUTE_CHANNEL_DETAIL, ROUTE_DISCOVER_CHANNEL, ROUTE_NOTIFICATION,
};
use causerie_shared::{ChannelId, GroupId, MessageId, TransportError};
use causerie_store::ChannelPage;
use uuid::Uuid;

/// Network calls used by the channel list.  Timeouts are the
/// implementation's responsibility.
pub trait ChannelTransport: Send + Sync + 'static {
    /// Fetch one page (1-based) of channels.
    fn fetch_channels_page(
        &self,
        page: u32,
    ) -> impl Future<Output = Result<ChannelPage, TransportError>> + Send;

    fn join_channel(
        &self,
        channel_id: ChannelId,
        group_id: GroupId,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Mark everything up to `message_id` as read.
    ///
    /// The returned future is spawned and never awaited by the caller, so it
    /// must own everything it needs.  Calling this method counts as issuing
    /// the ack.
    fn ack_message(
        &self,
        message_id: MessageId,
    ) -> impl Future<Output = Result<(), TransportError>> + Send + 'static;
}

/// Screens the channel list can navigate to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Channel(ChannelId),
    ChannelDetail(ChannelId),
    DiscoverChannels,
    Notifications,
}

impl Route {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Channel(_) => ROUTE_CHANNEL,
            Self::ChannelDetail(_) => ROUTE_CHANNEL_DETAIL,
            Self::DiscoverChannels => ROUTE_DISCOVER_CHANNEL,
            Self::Notifications => ROUTE_NOTIFICATION,
        }
    }

    pub fn channel_id(&self) -> Option<&ChannelId> {
        match self {
            Self::Channel(id) | Self::ChannelDetail(id) => Some(id),
            Self::DiscoverChannels | Self::Notifications => None,
        }
    }
}

pub trait Router: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Handle identifying one handler registration on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handler invoked with the push payload (`None` for an empty push).
pub type PushHandler = Box<dyn Fn(Option<String>) + Send + Sync>;

/// Pub/sub used to deliver notification pushes.  Delivery is at-least-once
/// and unordered.
pub trait NotificationBus: Send + Sync {
    fn subscribe(&self, topic: &str, handler: PushHandler) -> SubscriptionId;

    fn unsubscribe(&self, topic: &str, id: SubscriptionId);
}
