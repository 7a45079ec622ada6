/// Signal dispatcher
///
/// Maps signal names to handlers, runs the handler against the session under
/// the session lock, and publishes the result (or the handler's error) on the
/// notification bus under the signal's name.
use std::collections::HashMap;
use std::sync::Arc;

use super::context::{Devices, HandlerScope};
use super::frame::SignalEvent;
use crate::audio_system::Cue;
use crate::error::{HandlerError, TransportError};
use crate::messaging::{Notification, NotificationBus, Payload};
use crate::state::SharedSession;

/// Registered handler
pub type Handler =
    Box<dyn Fn(&mut HandlerScope<'_>, &[String]) -> Result<Payload, HandlerError> + Send + Sync>;

/// Outcome of consuming one signal
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// No handler registered; nothing was published
    UnknownSignal,

    /// Handler ran; this notification was published (possibly an error map)
    Notified(Notification),
}

pub struct SignalDispatcher {
    handlers: HashMap<String, Handler>,
    session: SharedSession,
    devices: Arc<Devices>,
    bus: NotificationBus,
}

impl SignalDispatcher {
    pub fn new(session: SharedSession, devices: Arc<Devices>, bus: NotificationBus) -> Self {
        Self {
            handlers: HashMap::new(),
            session,
            devices,
            bus,
        }
    }

    /// Bind `handler` to `signal`. Registration happens once, before any
    /// ingest loop starts; a second registration replaces the first.
    pub fn register<F>(&mut self, signal: impl Into<String>, handler: F)
    where
        F: Fn(&mut HandlerScope<'_>, &[String]) -> Result<Payload, HandlerError>
            + Send
            + Sync
            + 'static,
    {
        let signal = signal.into();
        if self.handlers.insert(signal.clone(), Box::new(handler)).is_some() {
            tracing::warn!("Handler for {} replaced", signal);
        }
    }

    pub fn is_registered(&self, signal: &str) -> bool {
        self.handlers.contains_key(signal)
    }

    pub fn signals(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn devices(&self) -> &Devices {
        &self.devices
    }

    pub fn consume(&self, event: &SignalEvent) -> Result<Dispatch, TransportError> {
        self.consume_signal(&event.signal, &event.args)
    }

    /// Run the handler for `signal` and publish its result.
    ///
    /// Handler failures become a `{"error": ...}` notification. Transport
    /// failures are returned without publishing; they end the calling loop.
    pub fn consume_signal(&self, signal: &str, args: &[String]) -> Result<Dispatch, TransportError> {
        let Some(handler) = self.handlers.get(signal) else {
            tracing::warn!("No handler registered for signal {}", signal);
            return Ok(Dispatch::UnknownSignal);
        };

        let result = {
            let mut session = self.session.lock();
            let mut scope = HandlerScope {
                session: &mut session,
                devices: &self.devices,
            };
            handler(&mut scope, args)
        };

        let payload = match result {
            Ok(payload) => payload,
            Err(HandlerError::Transport(err)) => {
                tracing::error!("Transport failure while handling {}: {}", signal, err);
                return Err(err);
            }
            Err(err) => {
                tracing::warn!("Handler for {} failed ({:?}): {}", signal, args, err);
                Payload::error(err.to_string())
            }
        };

        let notification = Notification::new(signal, payload);
        tracing::debug!("Notify {}", notification.description());
        self.bus.publish(notification.clone());

        Ok(Dispatch::Notified(notification))
    }

    /// Countdown step of the ingest loop: tick while a match is running.
    ///
    /// Returns whether a countdown cue fired.
    pub fn tick_countdown(&self) -> bool {
        let mut session = self.session.lock();
        if !session.is_active() {
            return false;
        }

        let cues = &self.devices.cues;
        let fired = session.tick_countdown(|| cues.play(Cue::Countdown));
        if fired {
            tracing::debug!("Countdown: {} left", session.countdown_remaining());
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_system::RecordingCues;
    use crate::clock::ManualClock;
    use crate::state::SessionState;

    struct Fixture {
        dispatcher: SignalDispatcher,
        bus: NotificationBus,
        clock: ManualClock,
        cues: Arc<RecordingCues>,
    }

    fn fixture() -> Fixture {
        let clock = ManualClock::new(1_000_000);
        let session = SharedSession::new(SessionState::new(Arc::new(clock.clone())));
        let cues = Arc::new(RecordingCues::new());
        let devices = Arc::new(Devices::new(cues.clone()));
        let bus = NotificationBus::new();
        Fixture {
            dispatcher: SignalDispatcher::new(session, devices, bus.clone()),
            bus,
            clock,
            cues,
        }
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_unknown_signal_publishes_nothing() {
        let fx = fixture();
        let (rx, _id) = fx.bus.subscribe();
        let before = fx.dispatcher.session().snapshot();

        let outcome = fx.dispatcher.consume_signal("LASER", &args(&["1"])).unwrap();

        assert_eq!(outcome, Dispatch::UnknownSignal);
        assert!(rx.try_recv().is_err());
        assert_eq!(fx.dispatcher.session().snapshot(), before);
    }

    #[test]
    fn test_handler_result_published_under_signal_name() {
        let mut fx = fixture();
        fx.dispatcher.register("PING", |scope: &mut HandlerScope<'_>, args: &[String]| {
            scope.session.record_score(args.len() as i64, None);
            Ok(Payload::new().with("pong", args.len() as i64))
        });
        let (rx, _id) = fx.bus.subscribe();

        fx.dispatcher.consume_signal("PING", &args(&["a", "b"])).unwrap();

        let notification = rx.try_recv().unwrap();
        assert_eq!(notification.topic, "PING");
        assert_eq!(notification.payload, Payload::new().with("pong", 2));
        assert_eq!(fx.dispatcher.session().snapshot().score, 2);
    }

    #[test]
    fn test_handler_error_becomes_error_payload() {
        let mut fx = fixture();
        fx.dispatcher.register("BROKEN", |_: &mut HandlerScope<'_>, _: &[String]| {
            Err(HandlerError::arguments("bad frame"))
        });
        let (rx, _id) = fx.bus.subscribe();

        let outcome = fx.dispatcher.consume_signal("BROKEN", &[]).unwrap();

        let expected = Notification::new("BROKEN", Payload::error("bad frame"));
        assert_eq!(outcome, Dispatch::Notified(expected.clone()));
        assert_eq!(rx.try_recv().unwrap(), expected);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_transport_error_propagates_without_notification() {
        let mut fx = fixture();
        fx.dispatcher.register("WRITE", |_: &mut HandlerScope<'_>, _: &[String]| {
            Err(HandlerError::Transport(TransportError::EndOfStream))
        });
        let (rx, _id) = fx.bus.subscribe();

        let result = fx.dispatcher.consume_signal("WRITE", &[]);

        assert!(matches!(result, Err(TransportError::EndOfStream)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_register_and_list_signals() {
        let mut fx = fixture();
        fx.dispatcher.register("B", |_: &mut HandlerScope<'_>, _: &[String]| Ok(Payload::new()));
        fx.dispatcher.register("A", |_: &mut HandlerScope<'_>, _: &[String]| Ok(Payload::new()));

        assert!(fx.dispatcher.is_registered("A"));
        assert!(!fx.dispatcher.is_registered("C"));
        assert_eq!(fx.dispatcher.signals(), vec!["A", "B"]);
    }

    #[test]
    fn test_tick_countdown_only_while_active() {
        let fx = fixture();
        assert!(!fx.dispatcher.tick_countdown());

        fx.dispatcher.session().lock().start_game(10);
        fx.clock.advance_secs(6);
        assert!(fx.dispatcher.tick_countdown());
        assert_eq!(fx.cues.play_count(Cue::Countdown), 1);

        fx.clock.advance_secs(10);
        assert!(!fx.dispatcher.tick_countdown());
        assert_eq!(fx.cues.play_count(Cue::Countdown), 1);
    }
}
