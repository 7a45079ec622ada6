//! Arcade Showdown server
//!
//! Reads `EMIT <SIGNAL> <args...>` frames from the game controller and the
//! clock board, keeps the match session, drives the score and clock boards,
//! plays audio cues, and publishes one notification per handled signal.

pub mod arcade;
pub mod audio_system;
pub mod clock;
pub mod config;
pub mod error;
pub mod hardware;
pub mod ingest;
pub mod messaging;
pub mod signals;
pub mod state;
pub mod supervisor;
pub mod transport;

pub use arcade::{Arcade, ArcadeBuilder, StatusReport};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Cli, Config};
pub use error::{AppResult, HandlerError, TransportError};
pub use ingest::{IngestCommand, IngestLoop, LoopExit, LoopRole};
pub use supervisor::{StopHandle, Supervisor};

/// Tracing target for startup diagnostics
pub const LOG_TARGET_STARTUP: &str = "arcade_showdown::startup";
