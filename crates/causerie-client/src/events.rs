//! Notification push plumbing: an in-process [`NotificationBus`] and the
//! scoped [`Subscription`] guard the screen holds while mounted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use crate::ports::{NotificationBus, PushHandler, SubscriptionId};

/// Registration that unsubscribes when dropped or cancelled.
pub struct Subscription {
    bus: Arc<dyn NotificationBus>,
    topic: String,
    id: Option<SubscriptionId>,
}

impl Subscription {
    /// Register `handler` on `topic` and return the guard owning it.
    pub fn register(bus: Arc<dyn NotificationBus>, topic: &str, handler: PushHandler) -> Self {
        let id = bus.subscribe(topic, handler);
        debug!(topic, subscription = %id, "Subscribed");
        Self {
            bus,
            topic: topic.to_string(),
            id: Some(id),
        }
    }

    pub fn id(&self) -> Option<SubscriptionId> {
        self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn is_active(&self) -> bool {
        self.id.is_some()
    }

    /// Release the registration now.  Calling it twice is a no-op.
    pub fn cancel(&mut self) {
        if let Some(id) = self.id.take() {
            self.bus.unsubscribe(&self.topic, id);
            debug!(topic = %self.topic, subscription = %id, "Unsubscribed");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("id", &self.id)
            .finish()
    }
}

type HandlerList = Vec<(SubscriptionId, Arc<dyn Fn(Option<String>) + Send + Sync>)>;

/// In-process bus keyed by topic.
#[derive(Default)]
pub struct LocalBus {
    topics: Mutex<HashMap<String, HandlerList>>,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `payload` to every handler on `topic`.  Returns how many
    /// handlers were called.
    pub fn publish(&self, topic: &str, payload: Option<String>) -> usize {
        // Handlers run outside the lock so they may (un)subscribe.
        let handlers: Vec<_> = {
            let topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
            match topics.get(topic) {
                Some(list) => list.iter().map(|(_, h)| Arc::clone(h)).collect(),
                None => Vec::new(),
            }
        };

        if handlers.is_empty() {
            warn!(topic, "Published to a topic without subscribers");
        }
        for handler in &handlers {
            handler(payload.clone());
        }
        handlers.len()
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        let topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
        topics.get(topic).map_or(0, Vec::len)
    }
}

impl NotificationBus for LocalBus {
    fn subscribe(&self, topic: &str, handler: PushHandler) -> SubscriptionId {
        let id = SubscriptionId::new();
        let mut topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
        topics
            .entry(topic.to_string())
            .or_default()
            .push((id, Arc::from(handler)));
        id
    }

    fn unsubscribe(&self, topic: &str, id: SubscriptionId) {
        let mut topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(list) = topics.get_mut(topic) {
            list.retain(|(sub, _)| *sub != id);
            if list.is_empty() {
                topics.remove(topic);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_handler(counter: &Arc<AtomicUsize>) -> PushHandler {
        let counter = Arc::clone(counter);
        Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_publish_reaches_subscribers_of_topic_only() {
        let bus = LocalBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        bus.subscribe("a", counting_handler(&hits));
        bus.subscribe("a", counting_handler(&hits));
        bus.subscribe("b", counting_handler(&hits));

        assert_eq!(bus.publish("a", Some("x".into())), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(bus.publish("missing", None), 0);
    }

    #[test]
    fn test_subscription_drop_unsubscribes() {
        let bus = Arc::new(LocalBus::new());
        let hits = Arc::new(AtomicUsize::new(0));

        {
            let sub = Subscription::register(bus.clone(), "topic", counting_handler(&hits));
            assert!(sub.is_active());
            assert_eq!(bus.subscriber_count("topic"), 1);
            bus.publish("topic", None);
        }

        assert_eq!(bus.subscriber_count("topic"), 0);
        bus.publish("topic", None);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let bus = Arc::new(LocalBus::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let mut sub = Subscription::register(bus.clone(), "topic", counting_handler(&hits));

        sub.cancel();
        sub.cancel();
        assert!(!sub.is_active());
        assert_eq!(bus.subscriber_count("topic"), 0);
    }
}
