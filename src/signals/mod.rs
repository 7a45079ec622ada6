/// Signal dispatch module
///
/// Turns device frames into session changes and notifications.
///
/// ## Architecture
///
/// ```text
/// "EMIT SCORE 12"
///   └── SignalEvent::parse
///       └── SignalDispatcher::consume
///           ├── handler (under the session lock)
///           │     ├── SessionState
///           │     └── Devices (score board, clock board, cues)
///           └── NotificationBus::publish(topic = signal)
/// ```
///
/// ## Usage
///
/// ```rust,ignore
/// let mut dispatcher = SignalDispatcher::new(session, devices, bus);
/// register_default_handlers(&mut dispatcher);
///
/// if let Some(event) = SignalEvent::parse(&line) {
///     dispatcher.consume(&event)?;
/// }
/// ```

pub mod context;
pub mod dispatcher;
pub mod frame;
pub mod handlers;

// Re-export commonly used types
pub use context::{Devices, HandlerScope};
pub use dispatcher::{Dispatch, Handler, SignalDispatcher};
pub use frame::{SignalEvent, EMIT};
pub use handlers::register_default_handlers;
