/// Notification bus for pub/sub messaging
///
/// The notification sink: every consumed signal is broadcast to all
/// subscribers (web push bridge, loggers, tests). Delivery is fire-and-forget;
/// a dropped subscriber is simply skipped.
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender, TrySendError};
use parking_lot::RwLock;

use super::notification::Notification;

/// Subscriber ID for tracking subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(usize);

struct Subscriber {
    id: SubscriberId,
    sender: Sender<Notification>,
}

/// Bus for broadcasting notifications to subscribers
pub struct NotificationBus {
    subscribers: Arc<RwLock<Vec<Subscriber>>>,
    next_id: Arc<RwLock<usize>>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(Vec::new())),
            next_id: Arc::new(RwLock::new(0)),
        }
    }

    /// Subscribe to notifications, returns a receiver and subscription ID
    pub fn subscribe(&self) -> (Receiver<Notification>, SubscriberId) {
        let (tx, rx) = unbounded();

        let mut next_id = self.next_id.write();
        let id = SubscriberId(*next_id);
        *next_id += 1;
        drop(next_id);

        self.subscribers.write().push(Subscriber { id, sender: tx });

        (rx, id)
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        self.subscribers.write().retain(|s| s.id != id);
    }

    /// Publish a notification to all subscribers (non-blocking)
    ///
    /// Subscribers whose receiver was dropped are removed.
    pub fn publish(&self, notification: Notification) {
        let mut disconnected = Vec::new();
        {
            let subscribers = self.subscribers.read();
            for subscriber in subscribers.iter() {
                if let Err(TrySendError::Disconnected(_)) =
                    subscriber.sender.try_send(notification.clone())
                {
                    disconnected.push(subscriber.id);
                }
            }
        }

        if !disconnected.is_empty() {
            tracing::debug!("Dropping {} disconnected subscriber(s)", disconnected.len());
            self.subscribers
                .write()
                .retain(|s| !disconnected.contains(&s.id));
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for NotificationBus {
    fn clone(&self) -> Self {
        Self {
            subscribers: Arc::clone(&self.subscribers),
            next_id: Arc::clone(&self.next_id),
        }
    }
}
