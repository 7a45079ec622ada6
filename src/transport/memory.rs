/// In-memory transports
///
/// Scripted input and recorded output for tests and offline replays.
use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{LineSink, LineSource};
use crate::error::TransportError;

/// Plays back a fixed list of lines, then reports end of stream
pub struct ScriptedLineSource {
    name: String,
    lines: VecDeque<String>,
}

impl ScriptedLineSource {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: "script".to_string(),
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl LineSource for ScriptedLineSource {
    fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        self.lines
            .pop_front()
            .map(|line| Some(line.trim().to_string()))
            .ok_or(TransportError::EndOfStream)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Captures every write
///
/// Clones share the same buffer, so a test can keep one handle while the
/// device owns another.
#[derive(Clone, Default)]
pub struct RecordingLineSink {
    name: String,
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
    fail_writes: bool,
}

impl RecordingLineSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            writes: Arc::new(Mutex::new(Vec::new())),
            fail_writes: false,
        }
    }

    /// Sink whose writes fail like a disconnected port
    pub fn failing(name: impl Into<String>) -> Self {
        Self {
            fail_writes: true,
            ..Self::new(name)
        }
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().clone()
    }

    /// Writes decoded as UTF-8
    pub fn written_strings(&self) -> Vec<String> {
        self.writes
            .lock()
            .iter()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .collect()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().len()
    }
}

impl LineSink for RecordingLineSink {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if self.fail_writes {
            return Err(TransportError::io(
                self.name.clone(),
                std::io::Error::new(std::io::ErrorKind::BrokenPipe, "device disconnected"),
            ));
        }
        self.writes.lock().push(bytes.to_vec());
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
