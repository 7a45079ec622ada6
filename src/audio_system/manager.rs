/// Audio cue player
///
/// Owns the rodio output stream on a dedicated thread and plays cues sent
/// to it over a channel. One-shot cues get their own sink so they overlap
/// freely; looping cues keep a sink until stopped.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use super::cues::CueSink;
use super::source::Cue;
use crate::error::AudioError;

/// Upper bound on how long the audio thread sleeps with nothing scheduled
const IDLE_WAIT: Duration = Duration::from_secs(60);

enum AudioCommand {
    Play(Cue),
    PlayAt(Cue, Instant),
    Stop(Cue),
    Shutdown,
}

/// Rodio-backed cue sink
pub struct CuePlayer {
    tx: Sender<AudioCommand>,
    loaded: Vec<Cue>,
}

impl CuePlayer {
    /// Load every cue found in `audio_dir` and start the audio thread.
    ///
    /// Missing or undecodable files disable that cue with a warning.
    pub fn spawn(audio_dir: &Path) -> Result<Self, AudioError> {
        if !audio_dir.is_dir() {
            return Err(AudioError::MissingDirectory(audio_dir.display().to_string()));
        }

        let clips = load_clips(audio_dir);
        let loaded: Vec<Cue> = Cue::ALL
            .iter()
            .copied()
            .filter(|cue| clips.contains_key(cue))
            .collect();

        let (tx, rx) = unbounded();
        let (ready_tx, ready_rx) = bounded(1);

        thread::Builder::new()
            .name("audio".to_string())
            .spawn(move || {
                // OutputStream is not Send; it has to live on this thread.
                let (stream, handle) = match OutputStream::try_default() {
                    Ok(pair) => pair,
                    Err(err) => {
                        let _ = ready_tx.send(Err(err.to_string()));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));
                run_audio_thread(&handle, clips, rx);
                drop(stream);
            })
            .map_err(AudioError::ThreadSpawnFailed)?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(message)) => return Err(AudioError::StreamInitFailed(message)),
            Err(_) => {
                return Err(AudioError::StreamInitFailed(
                    "audio thread exited during startup".to_string(),
                ))
            }
        }

        tracing::info!("Audio ready: {} of {} cues loaded", loaded.len(), Cue::ALL.len());
        Ok(Self { tx, loaded })
    }

    pub fn loaded_cues(&self) -> &[Cue] {
        &self.loaded
    }

    fn send(&self, command: AudioCommand) {
        if self.tx.send(command).is_err() {
            tracing::warn!("Audio thread is gone, cue dropped");
        }
    }
}

impl CueSink for CuePlayer {
    fn play(&self, cue: Cue) {
        self.send(AudioCommand::Play(cue));
    }

    fn play_after(&self, cue: Cue, delay: Duration) {
        self.send(AudioCommand::PlayAt(cue, Instant::now() + delay));
    }

    fn stop(&self, cue: Cue) {
        self.send(AudioCommand::Stop(cue));
    }
}

impl Drop for CuePlayer {
    fn drop(&mut self) {
        let _ = self.tx.send(AudioCommand::Shutdown);
    }
}

fn load_clips(audio_dir: &Path) -> HashMap<Cue, Arc<Vec<u8>>> {
    let mut clips = HashMap::new();

    for cue in Cue::ALL {
        let path = audio_dir.join(cue.file_name());
        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(err) => {
                tracing::warn!("Cue {} disabled, cannot read {}: {}", cue, path.display(), err);
                continue;
            }
        };

        // Verify the audio can be decoded
        if let Err(err) = Decoder::new(Cursor::new(data.clone())) {
            tracing::warn!("Cue {} disabled, cannot decode {}: {}", cue, path.display(), err);
            continue;
        }

        tracing::debug!("Loaded cue {}: {} ({} bytes)", cue, path.display(), data.len());
        clips.insert(cue, Arc::new(data));
    }

    clips
}

fn run_audio_thread(
    handle: &OutputStreamHandle,
    clips: HashMap<Cue, Arc<Vec<u8>>>,
    rx: Receiver<AudioCommand>,
) {
    let mut looping: HashMap<Cue, Sink> = HashMap::new();
    let mut scheduled: Vec<(Instant, Cue)> = Vec::new();

    tracing::debug!("Audio thread started");

    loop {
        let wait = scheduled
            .iter()
            .map(|(at, _)| at.saturating_duration_since(Instant::now()))
            .min()
            .unwrap_or(IDLE_WAIT);

        match rx.recv_timeout(wait) {
            Ok(AudioCommand::Play(cue)) => start_cue(handle, &clips, &mut looping, cue),
            Ok(AudioCommand::PlayAt(cue, at)) => scheduled.push((at, cue)),
            Ok(AudioCommand::Stop(cue)) => {
                scheduled.retain(|(_, pending)| *pending != cue);
                if let Some(sink) = looping.remove(&cue) {
                    sink.stop();
                    tracing::debug!("Stopped cue {}", cue);
                }
            }
            Ok(AudioCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }

        let now = Instant::now();
        let (due, later): (Vec<_>, Vec<_>) = scheduled.drain(..).partition(|(at, _)| *at <= now);
        scheduled = later;
        for (_, cue) in due {
            start_cue(handle, &clips, &mut looping, cue);
        }
    }

    for (_, sink) in looping.drain() {
        sink.stop();
    }
    tracing::debug!("Audio thread stopped");
}

fn start_cue(
    handle: &OutputStreamHandle,
    clips: &HashMap<Cue, Arc<Vec<u8>>>,
    looping: &mut HashMap<Cue, Sink>,
    cue: Cue,
) {
    let Some(data) = clips.get(&cue) else {
        tracing::debug!("Cue {} not loaded, skipping", cue);
        return;
    };

    if let Err(err) = try_start_cue(handle, data, looping, cue) {
        tracing::warn!("Failed to play cue {}: {}", cue, err);
    }
}

fn try_start_cue(
    handle: &OutputStreamHandle,
    data: &Arc<Vec<u8>>,
    looping: &mut HashMap<Cue, Sink>,
    cue: Cue,
) -> Result<(), Box<dyn std::error::Error>> {
    // rodio's Decoder needs owned 'static data
    let decoder = Decoder::new(Cursor::new((**data).clone()))?;
    let sink = Sink::try_new(handle)?;

    if cue.is_looping() {
        sink.append(decoder.repeat_infinite());
        sink.play();
        if let Some(previous) = looping.insert(cue, sink) {
            previous.stop();
        }
    } else {
        sink.append(decoder);
        sink.play();
        sink.detach();
    }

    tracing::debug!("Playing cue {}", cue);
    Ok(())
}
