/// State management module
///
/// Match state shared by the ingest loops, the dispatcher and the status query.

pub mod session;

// Re-export commonly used types
pub use session::{
    GameMode, SessionSnapshot, SessionState, SharedSession, COUNTDOWN_START,
    DEFAULT_DURATION_SECS,
};
