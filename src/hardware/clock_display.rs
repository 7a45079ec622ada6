/// Countdown clock board
///
/// Shows the time left until a target on its own millisecond counter. The
/// server sends the target already translated to the board's timeline.
use std::sync::Arc;

use parking_lot::Mutex;

use super::clock_sync::ClockSync;
use crate::clock::Clock;
use crate::error::{ClockError, TransportError};
use crate::transport::LineSink;

/// Why a countdown target was not delivered
#[derive(Debug)]
pub enum CountdownSkip {
    /// Offset unknown, or the target does not fit the board's timeline
    Clock(ClockError),
    Transport(TransportError),
}

pub struct ClockDisplay {
    sync: Mutex<ClockSync>,
    sink: Mutex<Box<dyn LineSink>>,
}

impl ClockDisplay {
    pub fn new(clock: Arc<dyn Clock>, sink: Box<dyn LineSink>) -> Self {
        Self {
            sync: Mutex::new(ClockSync::new(clock)),
            sink: Mutex::new(sink),
        }
    }

    /// Handle a `TIME_SYNC` report from the board
    pub fn sync(&self, hardware_millis: i64) -> Result<i64, ClockError> {
        self.sync.lock().set_offset(hardware_millis)
    }

    pub fn is_synced(&self) -> bool {
        self.sync.lock().is_synced()
    }

    pub fn to_hardware_time(&self, server_millis: i64) -> Result<i64, ClockError> {
        self.sync.lock().to_hardware_time(server_millis)
    }

    /// Send the countdown target (server time) to the board.
    ///
    /// Nothing is written when the offset is unknown. Returns the target in
    /// hardware time.
    pub fn send_countdown_target(&self, server_target_millis: i64) -> Result<i64, CountdownSkip> {
        let hardware_target = self
            .to_hardware_time(server_target_millis)
            .map_err(CountdownSkip::Clock)?;

        let mut sink = self.sink.lock();
        tracing::debug!("Clock board {} <- {}", sink.name(), hardware_target);
        sink.write_bytes(hardware_target.to_string().as_bytes())
            .map_err(CountdownSkip::Transport)?;

        Ok(hardware_target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::transport::RecordingLineSink;

    #[test]
    fn test_unsynced_sends_nothing() {
        let sink = RecordingLineSink::new("clock");
        let display = ClockDisplay::new(Arc::new(ManualClock::new(0)), Box::new(sink.clone()));

        let result = display.send_countdown_target(10_000);
        assert!(matches!(
            result,
            Err(CountdownSkip::Clock(ClockError::NotSynced))
        ));
        assert_eq!(sink.write_count(), 0);
    }

    #[test]
    fn test_target_sent_in_hardware_time_without_newline() {
        let clock = ManualClock::new(1_000_000);
        let sink = RecordingLineSink::new("clock");
        let display = ClockDisplay::new(Arc::new(clock.clone()), Box::new(sink.clone()));

        display.sync(2_500).unwrap();
        assert!(display.is_synced());

        let sent = display.send_countdown_target(1_032_000).unwrap();
        assert_eq!(sent, 34_500);
        assert_eq!(sink.written_strings(), vec!["34500".to_string()]);
    }

    #[test]
    fn test_write_failure_reported() {
        let display = ClockDisplay::new(
            Arc::new(ManualClock::new(0)),
            Box::new(RecordingLineSink::failing("clock")),
        );
        display.sync(0).unwrap();

        assert!(matches!(
            display.send_countdown_target(5),
            Err(CountdownSkip::Transport(_))
        ));
    }
}
