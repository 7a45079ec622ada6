use thiserror::Error;

/// Domain errors using thiserror for structured error handling.
///
/// Per-event errors (`HandlerError`, `ClockError`, `SessionError`) are
/// contained at the dispatcher boundary. Only `TransportError` is allowed to
/// end an ingest loop.

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Match end time requested while no match is active")]
    InvalidState,

    #[error("Match end time does not fit in a millisecond timestamp")]
    TimeOverflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClockError {
    #[error("Clock offset not synced (no TIME_SYNC received yet)")]
    NotSynced,

    #[error("Clock board time {0} is out of range")]
    OutOfRange(i64),
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Line source reached end of stream")]
    EndOfStream,

    #[error("I/O failure on {device}")]
    Io {
        device: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Ingest loop on {device} panicked")]
    Panicked { device: String },

    #[error("Failed to open serial port {port} at {baud_rate} baud")]
    Open {
        port: String,
        baud_rate: u32,
        #[source]
        source: serialport::Error,
    },
}

impl TransportError {
    pub fn io(device: impl Into<String>, source: std::io::Error) -> Self {
        TransportError::Io {
            device: device.into(),
            source,
        }
    }
}

/// Failure raised by a signal handler.
///
/// The `Display` text is what subscribers see in the `error` field of the
/// notification for that signal's topic.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("{0}")]
    InvalidArguments(String),

    #[error("Invalid integer argument: {0:?}")]
    InvalidInteger(String),

    #[error("{0} device is not configured")]
    MissingDevice(&'static str),

    #[error("Value {value} outside of {min}..={max}")]
    OutOfRange { value: i64, min: i64, max: i64 },

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Clock(#[from] ClockError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl HandlerError {
    pub fn arguments(message: impl Into<String>) -> Self {
        HandlerError::InvalidArguments(message.into())
    }
}

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to initialize audio output stream: {0}")]
    StreamInitFailed(String),

    #[error("Failed to start audio thread")]
    ThreadSpawnFailed(#[source] std::io::Error),

    #[error("Audio directory not found: {0}")]
    MissingDirectory(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to save configuration to {path}")]
    SaveFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Failed to start ingest thread {name}")]
    ThreadSpawnFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No ingest loops are running")]
    NotRunning,
}

/// Type alias for application Results using anyhow for context chaining
pub type AppResult<T> = anyhow::Result<T>;
