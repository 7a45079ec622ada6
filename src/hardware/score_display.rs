/// Score board output
///
/// The P10 score board shows whatever five characters it last received.
use parking_lot::Mutex;

use crate::error::TransportError;
use crate::transport::LineSink;

pub const MIN_SCORE: i64 = 0;
pub const MAX_SCORE: i64 = 99_999;

/// Fixed-width score command, `%05d\n`.
///
/// Panics when `score` is outside `0..=99999`; callers validate device input
/// before getting here.
pub fn format_score_command(score: i64) -> String {
    assert!(
        (MIN_SCORE..=MAX_SCORE).contains(&score),
        "score {score} does not fit the five digit display"
    );
    format!("{:05}\n", score)
}

pub struct ScoreDisplay {
    sink: Mutex<Box<dyn LineSink>>,
}

impl ScoreDisplay {
    pub fn new(sink: Box<dyn LineSink>) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    pub fn send_score(&self, score: i64) -> Result<(), TransportError> {
        let command = format_score_command(score);
        let mut sink = self.sink.lock();
        tracing::debug!("Score board {} <- {}", sink.name(), command.trim_end());
        sink.write_bytes(command.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::RecordingLineSink;

    #[test]
    fn test_format_bounds() {
        assert_eq!(format_score_command(0), "00000\n");
        assert_eq!(format_score_command(42), "00042\n");
        assert_eq!(format_score_command(99_999), "99999\n");
    }

    #[test]
    #[should_panic(expected = "five digit display")]
    fn test_format_rejects_overflow() {
        format_score_command(100_000);
    }

    #[test]
    #[should_panic(expected = "five digit display")]
    fn test_format_rejects_negative() {
        format_score_command(-1);
    }

    #[test]
    fn test_send_score_writes_command() {
        let sink = RecordingLineSink::new("score");
        let display = ScoreDisplay::new(Box::new(sink.clone()));

        display.send_score(7).unwrap();
        display.send_score(1234).unwrap();

        assert_eq!(sink.written_strings(), vec!["00007\n", "01234\n"]);
    }
}
