/// Arcade context
///
/// Owns everything the ingest loops share: the session, the output devices,
/// the notification bus and the dispatcher with the protocol handlers.
use std::sync::Arc;

use crossbeam_channel::Receiver;
use serde::Serialize;

use crate::audio_system::{CueSink, SilentCues};
use crate::clock::Clock;
use crate::hardware::{ClockDisplay, ScoreDisplay};
use crate::ingest::{IngestLoop, LoopRole};
use crate::messaging::{Notification, NotificationBus, SubscriberId};
use crate::signals::{register_default_handlers, Devices, SignalDispatcher};
use crate::state::{GameMode, SessionState, SharedSession, DEFAULT_DURATION_SECS};
use crate::transport::{LineSink, LineSource};

/// Answer to a status query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub score: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opponent_score: Option<i64>,
    pub mode: GameMode,
}

pub struct ArcadeBuilder {
    clock: Arc<dyn Clock>,
    cues: Arc<dyn CueSink>,
    score_sink: Option<Box<dyn LineSink>>,
    clock_sink: Option<Box<dyn LineSink>>,
    game_len_secs: i64,
    bus: NotificationBus,
}

impl ArcadeBuilder {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            cues: Arc::new(SilentCues),
            score_sink: None,
            clock_sink: None,
            game_len_secs: DEFAULT_DURATION_SECS,
            bus: NotificationBus::new(),
        }
    }

    /// Score board link
    pub fn score_sink(mut self, sink: impl LineSink + 'static) -> Self {
        self.score_sink = Some(Box::new(sink));
        self
    }

    /// Clock board link (write direction)
    pub fn clock_sink(mut self, sink: impl LineSink + 'static) -> Self {
        self.clock_sink = Some(Box::new(sink));
        self
    }

    pub fn cues(mut self, cues: Arc<dyn CueSink>) -> Self {
        self.cues = cues;
        self
    }

    /// Match length used until the first `GAME_ACTIVE`
    pub fn game_len(mut self, secs: i64) -> Self {
        self.game_len_secs = secs;
        self
    }

    pub fn bus(mut self, bus: NotificationBus) -> Self {
        self.bus = bus;
        self
    }

    pub fn build(self) -> Arcade {
        let session = SharedSession::new(SessionState::with_duration(
            self.clock.clone(),
            self.game_len_secs,
        ));

        let mut devices = Devices::new(self.cues);
        if let Some(sink) = self.score_sink {
            devices = devices.with_score_display(ScoreDisplay::new(sink));
        }
        if let Some(sink) = self.clock_sink {
            devices = devices.with_clock_display(ClockDisplay::new(self.clock, sink));
        }

        let mut dispatcher = SignalDispatcher::new(session.clone(), Arc::new(devices), self.bus.clone());
        register_default_handlers(&mut dispatcher);
        tracing::debug!("Registered signals: {:?}", dispatcher.signals());

        Arcade {
            session,
            dispatcher: Arc::new(dispatcher),
            bus: self.bus,
        }
    }
}

pub struct Arcade {
    session: SharedSession,
    dispatcher: Arc<SignalDispatcher>,
    bus: NotificationBus,
}

impl Arcade {
    pub fn builder(clock: Arc<dyn Clock>) -> ArcadeBuilder {
        ArcadeBuilder::new(clock)
    }

    /// Current score and mode, read under the session lock
    pub fn status(&self) -> StatusReport {
        let session = self.session.lock();
        StatusReport {
            score: session.score(),
            opponent_score: session.opponent_score(),
            mode: session.mode(),
        }
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn dispatcher(&self) -> &Arc<SignalDispatcher> {
        &self.dispatcher
    }

    pub fn bus(&self) -> &NotificationBus {
        &self.bus
    }

    pub fn subscribe(&self) -> (Receiver<Notification>, SubscriberId) {
        self.bus.subscribe()
    }

    pub fn ingest_loop<S: LineSource>(&self, role: LoopRole, source: S) -> IngestLoop<S> {
        IngestLoop::new(role, source, self.dispatcher.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::transport::RecordingLineSink;

    #[test]
    fn test_status_tracks_session() {
        let arcade = Arcade::builder(Arc::new(ManualClock::new(0))).build();
        assert_eq!(
            arcade.status(),
            StatusReport {
                score: 0,
                opponent_score: None,
                mode: GameMode::Showdown,
            }
        );

        arcade.dispatcher().consume_signal("GAME_MODE", &["1".to_string()]).unwrap();
        arcade
            .dispatcher()
            .consume_signal("SCORE", &["4".to_string(), "9".to_string()])
            .unwrap();

        let status = arcade.status();
        assert_eq!(status.score, 4);
        assert_eq!(status.opponent_score, Some(9));
        assert_eq!(status.mode, GameMode::Versus);
    }

    #[test]
    fn test_builder_wires_devices() {
        let score = RecordingLineSink::new("score");
        let clock_board = RecordingLineSink::new("clock");
        let arcade = Arcade::builder(Arc::new(ManualClock::new(0)))
            .score_sink(score.clone())
            .clock_sink(clock_board)
            .game_len(45)
            .build();

        let devices = arcade.dispatcher().devices();
        assert!(devices.score_display.is_some());
        assert!(devices.clock_display.is_some());
        assert_eq!(arcade.session().snapshot().duration_secs, 45);
        assert_eq!(arcade.dispatcher().signals().len(), 6);

        arcade.dispatcher().consume_signal("SCORE", &["12".to_string()]).unwrap();
        assert_eq!(score.written_strings(), vec!["00012\n"]);
    }

    #[test]
    fn test_status_serializes_without_missing_opponent() {
        let report = StatusReport {
            score: 3,
            opponent_score: None,
            mode: GameMode::Showdown,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["score"], 3);
        assert!(json.get("opponent_score").is_none());
    }
}
