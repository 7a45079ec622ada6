/// Cue sink contract
///
/// Handlers and the countdown only ask for cues; they never wait on audio.
use std::time::Duration;

use parking_lot::Mutex;

use super::source::Cue;

/// Receiver of audio cues
pub trait CueSink: Send + Sync {
    /// Start a cue now
    fn play(&self, cue: Cue);

    /// Start a cue after `delay` without blocking the caller
    fn play_after(&self, cue: Cue, delay: Duration);

    /// Stop a cue and cancel any scheduled start of it
    fn stop(&self, cue: Cue);
}

/// Ignores every cue (`--no-audio`)
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentCues;

impl CueSink for SilentCues {
    fn play(&self, cue: Cue) {
        tracing::trace!("Silent cue: {}", cue);
    }

    fn play_after(&self, cue: Cue, delay: Duration) {
        tracing::trace!("Silent cue: {} in {:?}", cue, delay);
    }

    fn stop(&self, _cue: Cue) {}
}

/// What a `RecordingCues` saw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueEvent {
    Play(Cue),
    PlayAfter(Cue, Duration),
    Stop(Cue),
}

/// Records cue requests for assertions
#[derive(Debug, Default)]
pub struct RecordingCues {
    events: Mutex<Vec<CueEvent>>,
}

impl RecordingCues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CueEvent> {
        self.events.lock().clone()
    }

    /// Number of immediate plays of `cue`
    pub fn play_count(&self, cue: Cue) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| **event == CueEvent::Play(cue))
            .count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl CueSink for RecordingCues {
    fn play(&self, cue: Cue) {
        self.events.lock().push(CueEvent::Play(cue));
    }

    fn play_after(&self, cue: Cue, delay: Duration) {
        self.events.lock().push(CueEvent::PlayAfter(cue, delay));
    }

    fn stop(&self, cue: Cue) {
        self.events.lock().push(CueEvent::Stop(cue));
    }
}
