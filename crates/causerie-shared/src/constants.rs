/// Maximum number of entries in the "popular channels" strip.
pub const POPULAR_CHANNEL_LIMIT: usize = 8;

/// Maximum number of discoverable channels shown while the user has joined
/// at least one channel. Without joined channels the section is uncapped.
pub const DISCOVER_CHANNEL_LIMIT: usize = 8;

/// First page requested by the channel fetcher (pages are 1-based).
pub const FIRST_PAGE: u32 = 1;

/// Event bus topic carrying unread-notification pushes.
pub const TOPIC_NEW_NOTIFICATIONS: &str = "newNotifications";

/// Router destinations
pub const ROUTE_CHANNEL: &str = "/channel";
pub const ROUTE_CHANNEL_DETAIL: &str = "/channel-detail";
pub const ROUTE_DISCOVER_CHANNEL: &str = "/discover-channel";
pub const ROUTE_NOTIFICATION: &str = "/notification";
