//! Message bus implementation.
//!
//! Provides the `MessageBus` shared by the components of one roster screen.
//! Delivery is synchronous: `publish` runs every registered handler, in
//! registration order, before it returns.

use parking_lot::RwLock;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use uuid::Uuid;

use super::events::RosterEvent;

/// Subscription handle for unsubscribing from the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Create a new unique subscription ID
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", &self.0.to_string()[..8])
    }
}

/// Type alias for message handler functions
type MessageHandler = Arc<dyn Fn(RosterEvent) + Send + Sync>;

/// Process-local publish/subscribe channel
///
/// No buffering and no replay: a handler registered after a publish never
/// sees that message.
pub struct MessageBus {
    /// Registered handlers, in registration order
    handlers: RwLock<Vec<(SubscriptionId, MessageHandler)>>,
}

impl MessageBus {
    /// Create a new, empty message bus
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// Publish a message to all current subscribers
    ///
    /// Handlers run on the calling thread, in registration order. A handler
    /// that panics is logged and skipped; delivery continues with the next
    /// one. Returns the number of handlers that completed normally.
    pub fn publish(&self, event: RosterEvent) -> usize {
        // Snapshot so handlers may subscribe/unsubscribe while being called.
        let handlers: Vec<(SubscriptionId, MessageHandler)> = self.handlers.read().clone();

        if handlers.is_empty() {
            tracing::trace!("No subscribers for {}", event.kind());
            return 0;
        }

        tracing::debug!(
            kind = %event.kind(),
            subscribers = handlers.len(),
            "{}",
            event.description()
        );

        let mut delivered = 0;
        for (id, handler) in handlers {
            let message = event.clone();
            match panic::catch_unwind(AssertUnwindSafe(|| handler(message))) {
                Ok(()) => delivered += 1,
                Err(_) => {
                    tracing::warn!("Handler {} panicked while handling {}", id, event.kind());
                }
            }
        }
        delivered
    }

    /// Subscribe to messages with a synchronous handler
    ///
    /// The handler will be called on the publishing thread, so it should
    /// return quickly to avoid blocking the publisher.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(RosterEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        self.handlers.write().push((id, Arc::new(handler)));
        tracing::debug!("Subscription {} added", id);
        id
    }

    /// Unsubscribe a handler
    ///
    /// Returns true if the subscription was found and removed. Unsubscribing
    /// twice is harmless and returns false the second time.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|(existing, _)| *existing != id);
        let removed = handlers.len() != before;
        if removed {
            tracing::debug!("Subscription {} removed", id);
        }
        removed
    }

    /// Get the number of active subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.handlers.read().len()
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ClassLabel, Status, Student, StudentId};
    use chrono::NaiveDate;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn student(id: &str) -> Student {
        Student {
            id: StudentId::from(id),
            name: "An".to_string(),
            email: "an@example.com".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(2008, 1, 1).unwrap(),
            class_label: ClassLabel::new(10, 1).unwrap(),
            status: Status::Active,
        }
    }

    #[test]
    fn test_message_bus_creation() {
        let bus = MessageBus::new();
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let bus = MessageBus::new();

        let id = bus.subscribe(|_| {});
        assert_eq!(bus.subscriber_count(), 1);

        assert!(bus.unsubscribe(id));
        assert_eq!(bus.subscriber_count(), 0);

        // Double unsubscribe should return false
        assert!(!bus.unsubscribe(id));
    }

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        let bus = MessageBus::new();
        assert_eq!(bus.publish(RosterEvent::Added), 0);
    }

    #[test]
    fn test_delivery_in_registration_order() {
        let bus = MessageBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for n in 0..4 {
            let order = order.clone();
            bus.subscribe(move |_| order.lock().push(n));
        }

        assert_eq!(bus.publish(RosterEvent::Added), 4);
        assert_eq!(*order.lock(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_payload_is_delivered() {
        let bus = MessageBus::new();
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = seen.clone();

        bus.subscribe(move |event| {
            if let RosterEvent::Edited(record) = event {
                *seen_clone.lock() = Some(record.id);
            }
        });

        bus.publish(RosterEvent::Edited(student("2")));
        assert_eq!(*seen.lock(), Some(StudentId::from("2")));
    }

    #[test]
    fn test_panicking_handler_does_not_block_others() {
        let bus = MessageBus::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let c1 = counter.clone();
        bus.subscribe(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        });
        bus.subscribe(|_| panic!("handler failure"));
        let c2 = counter.clone();
        bus.subscribe(move |_| {
            c2.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(bus.publish(RosterEvent::Added), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_late_subscriber_gets_no_replay() {
        let bus = MessageBus::new();
        bus.publish(RosterEvent::Added);

        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        bus.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_handler_may_unsubscribe_itself() {
        let bus = Arc::new(MessageBus::new());
        let slot: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));
        let counter = Arc::new(AtomicUsize::new(0));

        let bus_clone = bus.clone();
        let slot_clone = slot.clone();
        let c = counter.clone();
        let id = bus.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = *slot_clone.lock() {
                bus_clone.unsubscribe(id);
            }
        });
        *slot.lock() = Some(id);

        bus.publish(RosterEvent::Added);
        bus.publish(RosterEvent::Added);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
