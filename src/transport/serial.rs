/// Serial port transport
///
/// Arduino boards connected over USB serial. Reads use a timeout so the
/// ingest loop can notice shutdown requests between lines.
use std::io::{self, BufRead, BufReader, Write};
use std::time::Duration;

use serialport::SerialPort;

use super::{LineSink, LineSource};
use crate::error::TransportError;

fn open_port(
    port: &str,
    baud_rate: u32,
    timeout: Duration,
) -> Result<Box<dyn SerialPort>, TransportError> {
    serialport::new(port, baud_rate)
        .timeout(timeout)
        .open()
        .map_err(|source| TransportError::Open {
            port: port.to_string(),
            baud_rate,
            source,
        })
}

/// Line reader over a serial port
pub struct SerialLineSource {
    name: String,
    reader: BufReader<Box<dyn SerialPort>>,
    pending: Vec<u8>,
}

impl SerialLineSource {
    pub fn open(port: &str, baud_rate: u32, timeout: Duration) -> Result<Self, TransportError> {
        let handle = open_port(port, baud_rate, timeout)?;
        tracing::info!("Opened {} at {} baud for reading", port, baud_rate);
        Ok(Self::from_port(port, handle))
    }

    fn from_port(name: &str, port: Box<dyn SerialPort>) -> Self {
        Self {
            name: name.to_string(),
            reader: BufReader::new(port),
            pending: Vec::new(),
        }
    }
}

impl LineSource for SerialLineSource {
    fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        // A timeout can split a line; keep the partial bytes until the
        // newline shows up.
        match self.reader.read_until(b'\n', &mut self.pending) {
            Ok(0) if self.pending.is_empty() => Err(TransportError::EndOfStream),
            // Full line, or a trailing partial line at EOF
            Ok(_) => {
                let line = String::from_utf8_lossy(&self.pending).trim().to_string();
                self.pending.clear();
                Ok(Some(line))
            }
            Err(err) if err.kind() == io::ErrorKind::TimedOut => Ok(None),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => Ok(None),
            Err(err) => Err(TransportError::io(&self.name, err)),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Command writer over a serial port
pub struct SerialLineSink {
    name: String,
    port: Box<dyn SerialPort>,
}

impl SerialLineSink {
    pub fn open(port: &str, baud_rate: u32, timeout: Duration) -> Result<Self, TransportError> {
        let handle = open_port(port, baud_rate, timeout)?;
        tracing::info!("Opened {} at {} baud for writing", port, baud_rate);
        Ok(Self {
            name: port.to_string(),
            port: handle,
        })
    }
}

impl LineSink for SerialLineSink {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.port
            .write_all(bytes)
            .and_then(|_| self.port.flush())
            .map_err(|err| TransportError::io(&self.name, err))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Open one port for both directions.
///
/// The clock board reports `TIME_SYNC` and receives countdown targets on the
/// same link; the read half uses a cloned handle.
pub fn open_serial_pair(
    port: &str,
    baud_rate: u32,
    timeout: Duration,
) -> Result<(SerialLineSource, SerialLineSink), TransportError> {
    let handle = open_port(port, baud_rate, timeout)?;
    let reader = handle.try_clone().map_err(|source| TransportError::Open {
        port: port.to_string(),
        baud_rate,
        source,
    })?;
    tracing::info!("Opened {} at {} baud (read/write)", port, baud_rate);

    Ok((
        SerialLineSource::from_port(port, reader),
        SerialLineSink {
            name: port.to_string(),
            port: handle,
        },
    ))
}
