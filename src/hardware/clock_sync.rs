/// Server/hardware clock offset
///
/// The clock board runs its own free-running millisecond counter. On boot it
/// reports that counter (`TIME_SYNC`), which pins the offset between the two
/// timelines.
use std::sync::Arc;

use crate::clock::Clock;
use crate::error::ClockError;

pub struct ClockSync {
    clock: Arc<dyn Clock>,
    offset_millis: Option<i64>,
}

impl ClockSync {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            offset_millis: None,
        }
    }

    /// Record `server_now - hardware_millis`. Overwrites any earlier sync.
    ///
    /// A report too far from the server clock is rejected and the previous
    /// offset is kept.
    pub fn set_offset(&mut self, hardware_millis: i64) -> Result<i64, ClockError> {
        let offset = self
            .clock
            .now_millis()
            .checked_sub(hardware_millis)
            .ok_or(ClockError::OutOfRange(hardware_millis))?;
        self.offset_millis = Some(offset);
        Ok(offset)
    }

    pub fn offset_millis(&self) -> Option<i64> {
        self.offset_millis
    }

    pub fn is_synced(&self) -> bool {
        self.offset_millis.is_some()
    }

    /// Translate a server timestamp onto the hardware timeline
    pub fn to_hardware_time(&self, server_millis: i64) -> Result<i64, ClockError> {
        let offset = self.offset_millis.ok_or(ClockError::NotSynced)?;
        server_millis
            .checked_sub(offset)
            .ok_or(ClockError::OutOfRange(server_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn test_not_synced_until_first_sync() {
        let sync = ClockSync::new(Arc::new(ManualClock::new(5_000)));
        assert!(!sync.is_synced());
        assert_eq!(sync.to_hardware_time(10_000), Err(ClockError::NotSynced));
    }

    #[test]
    fn test_now_maps_to_reported_hardware_time() {
        let clock = ManualClock::new(1_700_000_000_123);
        let mut sync = ClockSync::new(Arc::new(clock.clone()));

        let offset = sync.set_offset(4_321).unwrap();
        assert_eq!(offset, 1_700_000_000_123 - 4_321);
        assert_eq!(sync.to_hardware_time(clock.now_millis()), Ok(4_321));

        // Both timelines advance together
        clock.advance(32_000);
        assert_eq!(sync.to_hardware_time(clock.now_millis()), Ok(36_321));
    }

    #[test]
    fn test_resync_overwrites_offset() {
        let clock = ManualClock::new(100_000);
        let mut sync = ClockSync::new(Arc::new(clock.clone()));

        sync.set_offset(1_000).unwrap();
        // Board rebooted: counter restarted
        clock.advance(60_000);
        sync.set_offset(50).unwrap();

        assert_eq!(sync.offset_millis(), Some(160_000 - 50));
        assert_eq!(sync.to_hardware_time(160_000), Ok(50));
    }

    #[test]
    fn test_extreme_reports_rejected() {
        let clock = ManualClock::new(1_700_000_000_000);
        let mut sync = ClockSync::new(Arc::new(clock));

        assert_eq!(
            sync.set_offset(i64::MIN),
            Err(ClockError::OutOfRange(i64::MIN))
        );
        assert!(!sync.is_synced());

        sync.set_offset(1_000).unwrap();
        assert_eq!(
            sync.set_offset(i64::MIN + 5),
            Err(ClockError::OutOfRange(i64::MIN + 5))
        );
        assert_eq!(sync.offset_millis(), Some(1_700_000_000_000 - 1_000));
    }

    #[test]
    fn test_translation_overflow_is_an_error() {
        let clock = ManualClock::new(0);
        let mut sync = ClockSync::new(Arc::new(clock));

        // Board counter far ahead: offset is hugely negative
        sync.set_offset(i64::MAX).unwrap();
        assert_eq!(
            sync.to_hardware_time(10),
            Err(ClockError::OutOfRange(10))
        );
    }
}
