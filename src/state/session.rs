/// Match session state
///
/// The authoritative record of the current match. Pure state and transition
/// logic, no I/O: the countdown cue is handed back to the caller as a
/// callback.
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use serde::Serialize;

use crate::clock::Clock;
use crate::error::SessionError;

/// Number of countdown cues available per match
pub const COUNTDOWN_START: i64 = 5;

/// Match length used before the first `GAME_ACTIVE`
pub const DEFAULT_DURATION_SECS: i64 = 30;

/// Game mode selected on the controller
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
pub enum GameMode {
    #[default]
    Showdown,
    Versus,
}

impl GameMode {
    /// Controller encoding: zero is Showdown, anything else is Versus
    pub fn from_code(code: i64) -> Self {
        if code == 0 {
            GameMode::Showdown
        } else {
            GameMode::Versus
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            GameMode::Showdown => 0,
            GameMode::Versus => 1,
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameMode::Showdown => write!(f, "Showdown"),
            GameMode::Versus => write!(f, "Versus"),
        }
    }
}

/// Read-only view returned by the status query
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub score: i64,
    pub opponent_score: Option<i64>,
    pub mode: GameMode,
    pub active: bool,
    pub duration_secs: i64,
    pub countdown_remaining: i64,
}

/// State of one match
pub struct SessionState {
    clock: Arc<dyn Clock>,
    start_millis: i64,
    duration_secs: i64,
    active: bool,
    countdown_remaining: i64,
    mode: GameMode,
    score: i64,
    opponent_score: Option<i64>,
}

impl SessionState {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_duration(clock, DEFAULT_DURATION_SECS)
    }

    pub fn with_duration(clock: Arc<dyn Clock>, duration_secs: i64) -> Self {
        let start_millis = clock.now_millis();
        Self {
            clock,
            start_millis,
            duration_secs,
            active: false,
            countdown_remaining: COUNTDOWN_START,
            mode: GameMode::default(),
            score: 0,
            opponent_score: None,
        }
    }

    /// End the match and re-arm the countdown. Score and mode are kept.
    pub fn reset(&mut self) {
        self.active = false;
        self.countdown_remaining = COUNTDOWN_START;
    }

    /// Start a match of `duration_secs` from now.
    ///
    /// The countdown is not re-armed here; only `reset` does that.
    pub fn start_game(&mut self, duration_secs: i64) {
        self.start_millis = self.clock.now_millis();
        self.duration_secs = duration_secs;
        self.active = true;
        self.score = 0;
        self.opponent_score = None;
    }

    fn elapsed_millis(&self) -> i64 {
        self.clock.now_millis().saturating_sub(self.start_millis)
    }

    fn duration_millis(&self) -> i64 {
        self.duration_secs.saturating_mul(1000)
    }

    /// True while a match was started and its time has not run out.
    ///
    /// Expiry is evaluated lazily; the stored flag only changes on `reset`.
    pub fn is_active(&self) -> bool {
        self.active && self.elapsed_millis() < self.duration_millis()
    }

    /// Scheduled end of the running match in server milliseconds
    pub fn end_time_millis(&self) -> Result<i64, SessionError> {
        if !self.active {
            return Err(SessionError::InvalidState);
        }
        self.start_millis
            .checked_add(self.duration_millis())
            .ok_or(SessionError::TimeOverflow)
    }

    /// Fire at most one countdown cue.
    ///
    /// When the remaining match time drops to `countdown_remaining` seconds
    /// or below, the counter is decremented and `on_cue` runs once. Returns
    /// whether the cue fired. Cadence follows the caller (one call per line
    /// read), not a timer.
    pub fn tick_countdown<F: FnOnce()>(&mut self, on_cue: F) -> bool {
        if self.countdown_remaining <= 0 {
            return false;
        }

        let remaining_millis = self.duration_millis().saturating_sub(self.elapsed_millis());
        if remaining_millis <= self.countdown_remaining * 1000 {
            self.countdown_remaining -= 1;
            on_cue();
            return true;
        }

        false
    }

    /// Record the latest score frame
    pub fn record_score(&mut self, score: i64, opponent_score: Option<i64>) {
        self.score = score;
        self.opponent_score = opponent_score;
    }

    pub fn set_mode(&mut self, mode: GameMode) {
        self.mode = mode;
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn opponent_score(&self) -> Option<i64> {
        self.opponent_score
    }

    pub fn duration_secs(&self) -> i64 {
        self.duration_secs
    }

    pub fn countdown_remaining(&self) -> i64 {
        self.countdown_remaining
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            score: self.score,
            opponent_score: self.opponent_score,
            mode: self.mode,
            active: self.is_active(),
            duration_secs: self.duration_secs,
            countdown_remaining: self.countdown_remaining,
        }
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("start_millis", &self.start_millis)
            .field("duration_secs", &self.duration_secs)
            .field("active", &self.active)
            .field("countdown_remaining", &self.countdown_remaining)
            .field("mode", &self.mode)
            .field("score", &self.score)
            .field("opponent_score", &self.opponent_score)
            .finish()
    }
}

/// Session state shared between the ingest loops and the status query
///
/// One lock guards every field, so readers always see a consistent
/// start time and duration.
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<SessionState>>,
}

impl SharedSession {
    pub fn new(state: SessionState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock()
    }

    pub fn is_active(&self) -> bool {
        self.inner.lock().is_active()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.lock().snapshot()
    }
}
