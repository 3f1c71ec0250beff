//! Opening, joining and pinning channels.

use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use causerie_shared::{CauserieError, ChannelId, GroupId, MessageId};

use crate::facade::{AckFailure, ActionFacade};
use crate::ports::{ChannelTransport, Route};

impl<T: ChannelTransport> ActionFacade<T> {
    /// Open a joined channel.  If it has a last message, an ack for it is
    /// issued first; the ack is not awaited and its failure never blocks
    /// navigation (it is logged and sent to [`ActionFacade::ack_failures`]).
    ///
    /// Without a runtime to run the ack on, the ack is skipped with a
    /// warning and navigation still happens.
    pub fn open_channel(&self, id: &ChannelId) -> Result<(), CauserieError> {
        self.require_channel(id)?;

        let projection = self.projection()?;
        if let Some(message_id) = projection.last_message_for(id) {
            self.spawn_ack(id.clone(), message_id.clone());
        }

        self.router.navigate(Route::Channel(id.clone()));
        debug!(channel_id = %id, "Opened channel");
        Ok(())
    }

    pub fn open_channel_detail(&self, id: &ChannelId) {
        self.router.navigate(Route::ChannelDetail(id.clone()));
    }

    /// Tap on a discovery tile: joined channels open directly, others show
    /// their detail page.
    pub fn open_discovered(&self, id: &ChannelId) -> Result<(), CauserieError> {
        let joined = self
            .state
            .channels
            .snapshot()
            .get(id)
            .map(|record| record.is_joined())
            .ok_or_else(|| CauserieError::missing_channel(id))?;

        if joined {
            self.open_channel(id)
        } else {
            self.open_channel_detail(id);
            Ok(())
        }
    }

    /// Show the joining spinner right away, before [`ActionFacade::join`]
    /// resolves.
    pub fn start_join(&self, id: &ChannelId) -> Result<(), CauserieError> {
        if self.state.channels.mark_joining(id)? {
            debug!(channel_id = %id, "Join started");
        }
        Ok(())
    }

    /// Ask the server to join.  On success the channel moves to the joined
    /// list; on failure the spinner is cleared and the transport error
    /// returned so the user can tap again.
    pub async fn join(&self, id: &ChannelId, group_id: &GroupId) -> Result<(), CauserieError> {
        self.require_channel(id)?;

        match self
            .transport
            .join_channel(id.clone(), group_id.clone())
            .await
        {
            Ok(()) => {
                self.state.channels.mark_joined(id)?;
                info!(channel_id = %id, group_id = %group_id, "Joined channel");
                Ok(())
            }
            Err(e) => {
                self.state.channels.clear_joining(id)?;
                warn!(channel_id = %id, error = %e, "Join failed");
                Err(e.into())
            }
        }
    }

    /// Flip the pin flag of a channel and return the new value.
    pub fn toggle_pin(&self, id: &ChannelId) -> bool {
        self.state.pins.toggle(id)
    }

    fn spawn_ack(&self, channel_id: ChannelId, message_id: MessageId) {
        let Some(runtime) = self.runtime.clone().or_else(|| Handle::try_current().ok()) else {
            warn!(
                channel_id = %channel_id,
                message_id = %message_id,
                "No async runtime, ack skipped"
            );
            return;
        };
        let ack = self.transport.ack_message(message_id.clone());
        let failures = self.ack_failures.clone();

        runtime.spawn(async move {
            match ack.await {
                Ok(()) => debug!(channel_id = %channel_id, message_id = %message_id, "Message acked"),
                Err(error) => {
                    warn!(
                        channel_id = %channel_id,
                        message_id = %message_id,
                        error = %error,
                        "Ack failed"
                    );
                    // Nobody listening is fine.
                    let _ = failures.send(AckFailure {
                        channel_id,
                        message_id,
                        error,
                    });
                }
            }
        });
    }
}
