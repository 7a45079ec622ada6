/// Audio system module
///
/// Plays the cabinet's sound cues in reaction to match events.
///
/// ## Architecture
///
/// ```text
/// CueSink (trait)
///   ├── CuePlayer      rodio, dedicated audio thread
///   ├── SilentCues     --no-audio
///   └── RecordingCues  tests
///
/// CuePlayer thread
///   ├── one-shot cues  (GameStart, GameWon, Hit, Countdown) ─┐ overlapping
///   └── looping cue    (BackgroundMusic)                    ─┘ playback
/// ```
///
/// ## Usage
///
/// ```rust,ignore
/// use audio_system::{Cue, CuePlayer, CueSink};
///
/// let player = CuePlayer::spawn(Path::new("audio"))?;
///
/// player.play(Cue::GameStart);
/// player.play_after(Cue::BackgroundMusic, Duration::from_secs(1));
///
/// // Later
/// player.stop(Cue::BackgroundMusic);
/// player.play(Cue::GameWon);
/// ```

pub mod cues;
pub mod manager;
pub mod source;

// Re-export commonly used types
pub use cues::{CueEvent, CueSink, RecordingCues, SilentCues};
pub use manager::CuePlayer;
pub use source::Cue;
