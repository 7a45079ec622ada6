/// Loop supervisor
///
/// Runs each ingest loop on its own named thread, keeps a stop channel per
/// loop, and reports loop exits in the order they happen.
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{select, unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::{SupervisorError, TransportError};
use crate::ingest::{IngestCommand, IngestLoop, LoopExit, LoopRole, LoopStats};
use crate::transport::LineSource;

struct RunningLoop {
    role: LoopRole,
    cmd_tx: Sender<IngestCommand>,
    handle: Option<thread::JoinHandle<()>>,
}

/// Reports a failed exit if the loop thread unwinds before sending its own
struct ExitGuard {
    role: LoopRole,
    source: String,
    exit_tx: Sender<LoopExit>,
    armed: bool,
}

impl ExitGuard {
    fn send(mut self, exit: LoopExit) {
        self.armed = false;
        let _ = self.exit_tx.send(exit);
    }
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!("{} loop on {} panicked", self.role, self.source);
        let _ = self.exit_tx.send(LoopExit {
            role: self.role,
            source: self.source.clone(),
            stats: LoopStats::default(),
            result: Err(TransportError::Panicked {
                device: self.source.clone(),
            }),
        });
    }
}

/// Cloneable handle that asks every supervised loop to stop
#[derive(Clone)]
pub struct StopHandle {
    senders: Vec<Sender<IngestCommand>>,
}

impl StopHandle {
    pub fn stop(&self) {
        for tx in &self.senders {
            let _ = tx.send(IngestCommand::Stop);
        }
    }
}

pub struct Supervisor {
    loops: Mutex<Vec<RunningLoop>>,
    exit_tx: Sender<LoopExit>,
    exit_rx: Receiver<LoopExit>,
}

impl Supervisor {
    pub fn new() -> Self {
        let (exit_tx, exit_rx) = unbounded();
        Self {
            loops: Mutex::new(Vec::new()),
            exit_tx,
            exit_rx,
        }
    }

    /// Start `ingest` on a thread named after its role
    pub fn spawn<S>(&self, ingest: IngestLoop<S>) -> Result<(), SupervisorError>
    where
        S: LineSource + 'static,
    {
        let role = ingest.role();
        let name = role.thread_name().to_string();
        let (cmd_tx, cmd_rx) = unbounded();
        let ingest = ingest.with_commands(cmd_rx);
        let guard = ExitGuard {
            role,
            source: ingest.source_name().to_string(),
            exit_tx: self.exit_tx.clone(),
            armed: true,
        };

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let exit = ingest.run();
                guard.send(exit);
            })
            .map_err(|source| SupervisorError::ThreadSpawnFailed {
                name: name.clone(),
                source,
            })?;

        info!("Started {} thread", name);
        self.loops.lock().push(RunningLoop {
            role,
            cmd_tx,
            handle: Some(handle),
        });
        Ok(())
    }

    pub fn running(&self) -> Vec<LoopRole> {
        self.loops.lock().iter().map(|l| l.role).collect()
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            senders: self.loops.lock().iter().map(|l| l.cmd_tx.clone()).collect(),
        }
    }

    pub fn stop_all(&self) {
        self.stop_handle().stop();
    }

    /// Block until the first loop ends
    pub fn wait_first_exit(&self) -> Result<LoopExit, SupervisorError> {
        if self.loops.lock().is_empty() {
            return Err(SupervisorError::NotRunning);
        }
        self.exit_rx.recv().map_err(|_| SupervisorError::NotRunning)
    }

    /// Block until the first loop ends or `interrupt` fires.
    ///
    /// `Ok(None)` means the wait was interrupted.
    pub fn wait_first_exit_or(
        &self,
        interrupt: &Receiver<()>,
    ) -> Result<Option<LoopExit>, SupervisorError> {
        if self.loops.lock().is_empty() {
            return Err(SupervisorError::NotRunning);
        }
        select! {
            recv(self.exit_rx) -> exit => exit.map(Some).map_err(|_| SupervisorError::NotRunning),
            recv(interrupt) -> _ => Ok(None),
        }
    }

    /// Stop every loop and collect the exits that arrive within `grace`.
    ///
    /// A loop blocked in a read that never returns is left detached.
    pub fn shutdown(self, grace: Duration) -> Vec<LoopExit> {
        self.drain(Vec::new(), grace)
    }

    /// Like [`Supervisor::shutdown`], for callers that already took one exit
    /// from [`Supervisor::wait_first_exit`]
    pub fn finish(self, first: LoopExit, grace: Duration) -> Vec<LoopExit> {
        self.drain(vec![first], grace)
    }

    fn drain(self, mut exits: Vec<LoopExit>, grace: Duration) -> Vec<LoopExit> {
        self.stop_all();

        let mut loops = std::mem::take(&mut *self.loops.lock());
        let deadline = Instant::now() + grace;

        while exits.len() < loops.len() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.exit_rx.recv_timeout(remaining) {
                Ok(exit) => {
                    debug!("{} loop exited", exit.role);
                    exits.push(exit);
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        for running in &mut loops {
            let finished = exits.iter().any(|e| e.role == running.role);
            match running.handle.take() {
                Some(handle) if finished => {
                    let _ = handle.join();
                }
                Some(_) => warn!("{} loop did not stop in time; detaching", running.role),
                None => {}
            }
        }

        exits
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_system::RecordingCues;
    use crate::clock::ManualClock;
    use crate::messaging::NotificationBus;
    use crate::signals::{register_default_handlers, Devices, SignalDispatcher};
    use crate::state::{SessionState, SharedSession};
    use crate::transport::ScriptedLineSource;
    use std::sync::Arc;

    /// Source that idles until stopped
    struct IdleSource;

    impl LineSource for IdleSource {
        fn read_line(&mut self) -> Result<Option<String>, TransportError> {
            thread::sleep(Duration::from_millis(5));
            Ok(None)
        }

        fn name(&self) -> &str {
            "idle"
        }
    }

    /// Source whose first read panics
    struct BrokenSource;

    impl LineSource for BrokenSource {
        fn read_line(&mut self) -> Result<Option<String>, TransportError> {
            panic!("driver fault");
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    fn dispatcher() -> Arc<SignalDispatcher> {
        let clock = ManualClock::new(0);
        let session = SharedSession::new(SessionState::new(Arc::new(clock)));
        let devices = Arc::new(Devices::new(Arc::new(RecordingCues::new())));
        let mut dispatcher = SignalDispatcher::new(session, devices, NotificationBus::new());
        register_default_handlers(&mut dispatcher);
        Arc::new(dispatcher)
    }

    #[test]
    fn test_wait_without_loops() {
        let supervisor = Supervisor::new();
        assert!(matches!(
            supervisor.wait_first_exit(),
            Err(SupervisorError::NotRunning)
        ));
    }

    #[test]
    fn test_first_failure_is_reported() {
        let dispatcher = dispatcher();
        let supervisor = Supervisor::new();
        supervisor
            .spawn(IngestLoop::new(LoopRole::Clock, IdleSource, dispatcher.clone()))
            .unwrap();
        supervisor
            .spawn(IngestLoop::new(
                LoopRole::Primary,
                ScriptedLineSource::new(["EMIT SCORE 3"]),
                dispatcher.clone(),
            ))
            .unwrap();

        assert_eq!(supervisor.running(), vec![LoopRole::Clock, LoopRole::Primary]);

        let first = supervisor.wait_first_exit().unwrap();
        assert_eq!(first.role, LoopRole::Primary);
        assert!(matches!(first.result, Err(TransportError::EndOfStream)));
        assert_eq!(dispatcher.session().snapshot().score, 3);

        let exits = supervisor.finish(first, Duration::from_secs(2));
        assert_eq!(exits.len(), 2);
        assert!(exits[1].result.is_ok());
    }

    #[test]
    fn test_wait_interrupted() {
        let supervisor = Supervisor::new();
        supervisor
            .spawn(IngestLoop::new(LoopRole::Clock, IdleSource, dispatcher()))
            .unwrap();
        let (interrupt_tx, interrupt_rx) = unbounded();
        interrupt_tx.send(()).unwrap();

        assert!(supervisor.wait_first_exit_or(&interrupt_rx).unwrap().is_none());

        let exits = supervisor.shutdown(Duration::from_secs(2));
        assert_eq!(exits.len(), 1);
        assert!(exits[0].result.is_ok());
    }

    #[test]
    fn test_stop_handle_stops_idle_loops() {
        let supervisor = Supervisor::new();
        supervisor
            .spawn(IngestLoop::new(LoopRole::Clock, IdleSource, dispatcher()))
            .unwrap();

        supervisor.stop_handle().stop();
        let exit = supervisor.wait_first_exit().unwrap();

        assert_eq!(exit.role, LoopRole::Clock);
        assert!(!exit.is_failure());
    }

    #[test]
    fn test_panicking_loop_still_reports_exit() {
        let dispatcher = dispatcher();
        let supervisor = Supervisor::new();
        supervisor
            .spawn(IngestLoop::new(LoopRole::Clock, IdleSource, dispatcher.clone()))
            .unwrap();
        supervisor
            .spawn(IngestLoop::new(LoopRole::Primary, BrokenSource, dispatcher))
            .unwrap();

        let first = supervisor.wait_first_exit().unwrap();
        assert_eq!(first.role, LoopRole::Primary);
        assert_eq!(first.source, "broken");
        assert!(matches!(
            first.result,
            Err(TransportError::Panicked { ref device }) if device == "broken"
        ));

        let exits = supervisor.finish(first, Duration::from_secs(2));
        assert_eq!(exits.len(), 2);
        assert!(exits[1].result.is_ok());
    }
}
