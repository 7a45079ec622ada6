/// Hardware output adapters
///
/// Commands sent back to the boards. Each device serializes its own writes
/// behind a lock, so handlers running on either ingest loop never interleave
/// partial commands on the wire.

pub mod clock_display;
pub mod clock_sync;
pub mod score_display;

// Re-export commonly used types
pub use clock_display::{ClockDisplay, CountdownSkip};
pub use clock_sync::ClockSync;
pub use score_display::{format_score_command, ScoreDisplay, MAX_SCORE, MIN_SCORE};
