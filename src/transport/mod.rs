/// Device transport module
///
/// Byte-stream connections reduced to two contracts:
/// - **LineSource**: read one newline-terminated text line
/// - **LineSink**: write raw bytes
///
/// ## Implementations
///
/// ```text
/// LineSource
///   ├── SerialLineSource   (game controller, clock board)
///   ├── StdinLineSource    (--test mode)
///   └── ScriptedLineSource (tests, replays)
///
/// LineSink
///   ├── SerialLineSink     (score board, clock board)
///   └── RecordingLineSink  (tests)
/// ```

pub mod memory;
pub mod serial;
pub mod stdin;

use crate::error::TransportError;

/// Source of device lines
pub trait LineSource: Send {
    /// Read the next line with surrounding whitespace trimmed.
    ///
    /// `Ok(None)` means no line arrived within the source's poll interval;
    /// the caller may check for shutdown and read again. End of stream and
    /// I/O failures are errors and end the owning loop.
    fn read_line(&mut self) -> Result<Option<String>, TransportError>;

    /// Device name for logs
    fn name(&self) -> &str;
}

/// Sink for device commands
pub trait LineSink: Send {
    /// Write all bytes and flush
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Device name for logs
    fn name(&self) -> &str;
}

impl<T: LineSource + ?Sized> LineSource for Box<T> {
    fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        (**self).read_line()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: LineSink + ?Sized> LineSink for Box<T> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write_bytes(bytes)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

// Re-export commonly used types
pub use memory::{RecordingLineSink, ScriptedLineSource};
pub use serial::{open_serial_pair, SerialLineSink, SerialLineSource};
pub use stdin::StdinLineSource;
