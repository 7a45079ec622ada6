/// Handler context
///
/// What a signal handler may touch: the locked session and the output
/// devices.
use std::sync::Arc;

use crate::audio_system::{CueSink, SilentCues};
use crate::hardware::{ClockDisplay, ScoreDisplay};
use crate::state::SessionState;

/// Output devices shared by every handler
pub struct Devices {
    pub score_display: Option<ScoreDisplay>,
    pub clock_display: Option<ClockDisplay>,
    pub cues: Arc<dyn CueSink>,
}

impl Devices {
    pub fn new(cues: Arc<dyn CueSink>) -> Self {
        Self {
            score_display: None,
            clock_display: None,
            cues,
        }
    }

    pub fn with_score_display(mut self, display: ScoreDisplay) -> Self {
        self.score_display = Some(display);
        self
    }

    pub fn with_clock_display(mut self, display: ClockDisplay) -> Self {
        self.clock_display = Some(display);
        self
    }
}

impl Default for Devices {
    fn default() -> Self {
        Self::new(Arc::new(SilentCues))
    }
}

/// Passed to a handler for the duration of one signal
pub struct HandlerScope<'a> {
    pub session: &'a mut SessionState,
    pub devices: &'a Devices,
}
