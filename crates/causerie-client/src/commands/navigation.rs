//! Navigation to the discovery and notification screens.

use tracing::debug;

use crate::facade::ActionFacade;
use crate::ports::{ChannelTransport, Route};

impl<T: ChannelTransport> ActionFacade<T> {
    pub fn open_discovery(&self) {
        self.router.navigate(Route::DiscoverChannels);
    }

    /// Open the notification list and clear the unread badge.
    pub fn open_notifications(&self) {
        self.router.navigate(Route::Notifications);
        self.state.notifications.acknowledge();
        debug!("Opened notifications");
    }
}
