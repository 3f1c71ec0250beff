//! Lifetime of the messenger screen.
//!
//! Mounting wires the notification feed into the badge and builds the
//! facade; disposing releases the feed and makes in-flight fetches drop
//! their results.  Dropping the screen disposes it.

use std::sync::Arc;

use tracing::info;

use crate::config::ClientConfig;
use crate::events::Subscription;
use crate::facade::ActionFacade;
use crate::ports::{ChannelTransport, NotificationBus, PushHandler, Router};
use crate::state::ClientState;

pub struct MessengerScreen<T: ChannelTransport> {
    facade: Arc<ActionFacade<T>>,
    notifications: Option<Subscription>,
}

impl<T: ChannelTransport> MessengerScreen<T> {
    pub fn mount(
        state: ClientState,
        transport: Arc<T>,
        router: Arc<dyn Router>,
        bus: Arc<dyn NotificationBus>,
        config: &ClientConfig,
    ) -> Self {
        let gate = state.notifications.clone();
        let handler: PushHandler = Box::new(move |payload| {
            gate.on_push(payload);
        });
        let notifications = Subscription::register(bus, &config.notification_topic, handler);

        let facade = Arc::new(ActionFacade::new(state, transport, router, config.limits()));
        info!(topic = %config.notification_topic, "Messenger screen mounted");

        Self {
            facade,
            notifications: Some(notifications),
        }
    }

    pub fn facade(&self) -> &Arc<ActionFacade<T>> {
        &self.facade
    }

    pub fn is_mounted(&self) -> bool {
        self.notifications.is_some()
    }

    /// Tear down.  Calling it more than once is a no-op.
    pub fn dispose(&mut self) {
        if let Some(mut subscription) = self.notifications.take() {
            subscription.cancel();
            self.facade.dispose();
            info!("Messenger screen disposed");
        }
    }
}

impl<T: ChannelTransport> Drop for MessengerScreen<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::LocalBus;
    use crate::testing::{FakeTransport, RecordingRouter};
    use causerie_shared::constants::TOPIC_NEW_NOTIFICATIONS;
    use causerie_shared::CauserieError;
    use causerie_store::{ChannelPage, ChannelRecord};

    fn mount(bus: &Arc<LocalBus>, transport: &Arc<FakeTransport>) -> MessengerScreen<FakeTransport> {
        MessengerScreen::mount(
            ClientState::new(),
            transport.clone(),
            Arc::new(RecordingRouter::default()),
            bus.clone(),
            &ClientConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_pushes_raise_badge_while_mounted() {
        let bus = Arc::new(LocalBus::new());
        let transport = Arc::new(FakeTransport::new());
        let screen = mount(&bus, &transport);

        bus.publish(TOPIC_NEW_NOTIFICATIONS, None);
        assert!(!screen.facade().notification_state().has_unread);

        bus.publish(TOPIC_NEW_NOTIFICATIONS, Some(String::new()));
        assert!(screen.facade().notification_state().has_unread);
    }

    #[tokio::test]
    async fn test_dispose_releases_subscription() {
        let bus = Arc::new(LocalBus::new());
        let transport = Arc::new(FakeTransport::new());
        let mut screen = mount(&bus, &transport);
        assert_eq!(bus.subscriber_count(TOPIC_NEW_NOTIFICATIONS), 1);

        screen.dispose();
        screen.dispose();
        assert!(!screen.is_mounted());
        assert_eq!(bus.subscriber_count(TOPIC_NEW_NOTIFICATIONS), 0);

        drop(screen);
        assert_eq!(bus.subscriber_count(TOPIC_NEW_NOTIFICATIONS), 0);
    }

    #[tokio::test]
    async fn test_drop_unsubscribes() {
        let bus = Arc::new(LocalBus::new());
        let transport = Arc::new(FakeTransport::new());
        drop(mount(&bus, &transport));
        assert_eq!(bus.subscriber_count(TOPIC_NEW_NOTIFICATIONS), 0);
    }

    #[tokio::test]
    async fn test_late_fetch_after_dispose_is_discarded() {
        let bus = Arc::new(LocalBus::new());
        let transport = Arc::new(FakeTransport::new());
        let gate = transport.hold_fetches();
        let mut record = ChannelRecord::from("late");
        record.is_public = true;
        transport.push_page(Ok(ChannelPage {
            items: vec![record],
            has_more: false,
        }));

        let mut screen = mount(&bus, &transport);
        let facade = screen.facade().clone();
        let pending = tokio::spawn(async move { facade.refresh_page(true).await });
        transport.wait_for_fetch().await;

        screen.dispose();
        gate.release();

        assert_eq!(pending.await.unwrap(), Err(CauserieError::ScreenDisposed));
        assert!(screen.facade().state().channels.snapshot().is_empty());
    }
}
