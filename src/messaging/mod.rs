/// Messaging module for outward notifications
///
/// ## Architecture
///
/// ```text
/// ┌────────────┐  consume_signal  ┌────────────┐  Notification  ┌──────────────────┐
/// │ IngestLoop │ ───────────────> │ Dispatcher │ ─────────────> │ NotificationBus  │
/// └────────────┘                  └────────────┘                └──────────────────┘
///                                                                        │
///                                                                        │ Publishes
///                                                                        ▼
///                                                                 ┌─────────────┐
///                                                                 │ Subscribers │
///                                                                 │ (web push,  │
///                                                                 │  logger)    │
///                                                                 └─────────────┘
/// ```
///
/// ## Usage
///
/// ```rust,ignore
/// let bus = NotificationBus::new();
/// let (rx, _id) = bus.subscribe();
///
/// while let Ok(notification) = rx.recv() {
///     println!("{}", notification.to_json()?);
/// }
/// ```

pub mod bus;
pub mod notification;

// Re-export commonly used types
pub use bus::{NotificationBus, SubscriberId};
pub use notification::{Notification, Payload, PayloadValue};
