/// Ingest loop
///
/// One loop per line source. Each iteration reads a line, ticks the match
/// countdown (primary loop only) and dispatches `EMIT` frames. Lines are
/// handled strictly in arrival order; a transport failure ends the loop.
use std::fmt;
use std::sync::Arc;

use crossbeam_channel::{Receiver, TryRecvError};
use tracing::{debug, error, info};

use crate::error::TransportError;
use crate::signals::{Dispatch, SignalDispatcher, SignalEvent};
use crate::transport::LineSource;

/// Which device a loop listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopRole {
    /// Game controller: drives the countdown
    Primary,

    /// Clock board: only reports `TIME_SYNC`
    Clock,
}

impl LoopRole {
    pub fn ticks_countdown(&self) -> bool {
        matches!(self, LoopRole::Primary)
    }

    pub fn thread_name(&self) -> &'static str {
        match self {
            LoopRole::Primary => "ingest-primary",
            LoopRole::Clock => "ingest-clock",
        }
    }
}

impl fmt::Display for LoopRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopRole::Primary => write!(f, "Primary"),
            LoopRole::Clock => write!(f, "Clock"),
        }
    }
}

/// Commands checked between line reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestCommand {
    Stop,
}

/// Per-loop counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoopStats {
    pub lines: u64,
    pub frames: u64,
    pub notified: u64,
    pub unknown: u64,
    pub countdown_cues: u64,
}

/// Reported when a loop ends
#[derive(Debug)]
pub struct LoopExit {
    pub role: LoopRole,
    pub source: String,
    pub stats: LoopStats,
    /// `Ok` on a requested stop, the transport failure otherwise
    pub result: Result<(), TransportError>,
}

impl LoopExit {
    pub fn is_failure(&self) -> bool {
        self.result.is_err()
    }
}

pub struct IngestLoop<S: LineSource> {
    role: LoopRole,
    source: S,
    dispatcher: Arc<SignalDispatcher>,
    commands: Option<Receiver<IngestCommand>>,
    echo_lines: bool,
    stats: LoopStats,
}

impl<S: LineSource> IngestLoop<S> {
    pub fn new(role: LoopRole, source: S, dispatcher: Arc<SignalDispatcher>) -> Self {
        Self {
            role,
            source,
            dispatcher,
            commands: None,
            echo_lines: false,
            stats: LoopStats::default(),
        }
    }

    /// Stop requests arrive on `commands`; a disconnected channel also stops
    /// the loop.
    pub fn with_commands(mut self, commands: Receiver<IngestCommand>) -> Self {
        self.commands = Some(commands);
        self
    }

    /// Log every raw line at info level (`--debug`)
    pub fn echo_lines(mut self, echo: bool) -> Self {
        self.echo_lines = echo;
        self
    }

    pub fn role(&self) -> LoopRole {
        self.role
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Handle one line: countdown tick, then frame dispatch
    pub fn process_line(&mut self, line: &str) -> Result<(), TransportError> {
        self.stats.lines += 1;
        if self.echo_lines {
            info!("{} read: {}", self.role, line);
        } else {
            debug!("{} read: {}", self.role, line);
        }

        if self.role.ticks_countdown() && self.dispatcher.tick_countdown() {
            self.stats.countdown_cues += 1;
        }

        let Some(event) = SignalEvent::parse(line) else {
            return Ok(());
        };
        self.stats.frames += 1;

        match self.dispatcher.consume(&event)? {
            Dispatch::UnknownSignal => self.stats.unknown += 1,
            Dispatch::Notified(_) => self.stats.notified += 1,
        }

        Ok(())
    }

    fn stop_requested(&self) -> bool {
        match &self.commands {
            Some(commands) => match commands.try_recv() {
                Ok(IngestCommand::Stop) => true,
                Err(TryRecvError::Empty) => false,
                Err(TryRecvError::Disconnected) => true,
            },
            None => false,
        }
    }

    /// Run until stopped or until the source fails
    pub fn run(mut self) -> LoopExit {
        let source_name = self.source.name().to_string();
        info!("{} loop listening on {}", self.role, source_name);

        if self.role == LoopRole::Primary {
            self.dispatcher.session().lock().reset();
        }

        let result = loop {
            if self.stop_requested() {
                info!("{} loop stop requested", self.role);
                break Ok(());
            }

            match self.source.read_line() {
                Ok(Some(line)) => {
                    if let Err(err) = self.process_line(&line) {
                        break Err(err);
                    }
                }
                Ok(None) => {}
                Err(err) => break Err(err),
            }
        };

        match &result {
            Ok(()) => info!(
                "{} loop stopped after {} lines ({} frames)",
                self.role, self.stats.lines, self.stats.frames
            ),
            Err(err) => error!(
                "{} loop on {} terminated: {}",
                self.role, source_name, err
            ),
        }

        LoopExit {
            role: self.role,
            source: source_name,
            stats: self.stats,
            result,
        }
    }
}
