/// Audio cue catalog
///
/// The discrete sounds the cabinet plays in reaction to match events.
use std::fmt;

/// Audio cues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    /// Match start sting
    GameStart,

    /// Looping music under a running match
    BackgroundMusic,

    /// Match over
    GameWon,

    /// Target hit or mode switch
    Hit,

    /// One beep per second in the final seconds
    Countdown,
}

impl Cue {
    pub const ALL: [Cue; 5] = [
        Cue::GameStart,
        Cue::BackgroundMusic,
        Cue::GameWon,
        Cue::Hit,
        Cue::Countdown,
    ];

    /// File name inside the audio directory
    pub fn file_name(&self) -> &'static str {
        match self {
            Cue::GameStart => "game_start.ogg",
            Cue::BackgroundMusic => "draw_screen_loop.ogg",
            Cue::GameWon => "game_won.ogg",
            Cue::Hit => "hit.ogg",
            Cue::Countdown => "countdown.ogg",
        }
    }

    /// Looping cues play until stopped
    pub fn is_looping(&self) -> bool {
        matches!(self, Cue::BackgroundMusic)
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cue::GameStart => write!(f, "Game Start"),
            Cue::BackgroundMusic => write!(f, "Background Music"),
            Cue::GameWon => write!(f, "Game Won"),
            Cue::Hit => write!(f, "Hit"),
            Cue::Countdown => write!(f, "Countdown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cue_display() {
        assert_eq!(Cue::BackgroundMusic.to_string(), "Background Music");
        assert_eq!(Cue::Countdown.to_string(), "Countdown");
    }

    #[test]
    fn test_cue_files_are_distinct() {
        let mut names: Vec<_> = Cue::ALL.iter().map(Cue::file_name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Cue::ALL.len());
    }

    #[test]
    fn test_only_background_loops() {
        assert!(Cue::BackgroundMusic.is_looping());
        assert!(!Cue::Hit.is_looping());
        assert!(!Cue::GameWon.is_looping());
    }
}
