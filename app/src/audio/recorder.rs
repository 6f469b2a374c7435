use shared::TranscriptEvent;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::audio::AudioWindow;
use crate::config::Config;
use crate::services::Transcriber;
use crate::vad::{VoiceActivityGate, WindowClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderPhase {
    /// Constructed, sampling task not yet running.
    Idle,
    /// Consuming capture chunks, no window closed yet.
    Sampling,
    /// Closed windows feed the gate's calibration path.
    Calibrating,
    /// Calibrated; windows are classified and speech goes to transcription.
    Ready,
}

#[derive(Debug, Clone, Copy)]
pub struct RecorderStatus {
    pub phase: RecorderPhase,
    pub last_window_at: tokio::time::Instant,
    pub windows_closed: u64,
}

/// Live handle to a spawned recorder task. The transcript channel carries
/// one event per speech window the transcriber recognized text in.
pub struct RecorderHandle {
    pub transcripts: mpsc::Receiver<TranscriptEvent>,
    pub status: watch::Receiver<RecorderStatus>,
    interval: Duration,
    task: JoinHandle<()>,
}

impl RecorderHandle {
    pub fn is_ready(&self) -> bool {
        self.status.borrow().phase == RecorderPhase::Ready
    }

    pub fn seconds_until_next_window(&self) -> u64 {
        let elapsed = self.status.borrow().last_window_at.elapsed();
        self.interval.saturating_sub(elapsed).as_secs()
    }

    pub async fn stop(self) {
        self.task.abort();
        let _ = self.task.await;
        info!("Recorder task stopped");
    }
}

/// Owns the background sampling loop: assembles one fixed-duration
/// AudioWindow per recording interval from the capture chunk stream, runs
/// it through the voice activity gate and hands speech windows to the
/// transcriber on their own task so a slow transcription never delays the
/// next window.
pub struct ContinuousRecorder {
    gate: VoiceActivityGate,
    transcriber: Arc<dyn Transcriber>,
    interval: Duration,
    transcription_timeout: Duration,
    language: String,
    sample_rate: u32,
    gain: f32,
    transcript_capacity: usize,
}

impl ContinuousRecorder {
    pub fn new(config: &Config, gate: VoiceActivityGate, transcriber: Arc<dyn Transcriber>) -> Self {
        Self {
            gate,
            transcriber,
            interval: Duration::from_secs(config.recording.interval_seconds),
            transcription_timeout: Duration::from_secs(config.timeouts.transcription_seconds),
            language: config.recognition.language.clone(),
            sample_rate: config.audio.sample_rate,
            gain: config.audio.gain,
            transcript_capacity: config.buffer.transcript_capacity,
        }
    }

    pub fn spawn(mut self, mut chunks: broadcast::Receiver<Vec<f32>>) -> RecorderHandle {
        let (transcript_tx, transcript_rx) = mpsc::channel(self.transcript_capacity.max(1));
        let (status_tx, status_rx) = watch::channel(RecorderStatus {
            phase: RecorderPhase::Idle,
            last_window_at: tokio::time::Instant::now(),
            windows_closed: 0,
        });
        let interval = self.interval;

        let task = tokio::spawn(async move {
            info!(
                "Recorder task started: one window per {:?}, language {}",
                self.interval, self.language
            );

            let mut windows_closed: u64 = 0;
            let mut samples: Vec<f32> = Vec::new();
            let mut window_started = std::time::Instant::now();
            let publish = |phase: RecorderPhase, windows: u64| {
                let _ = status_tx.send(RecorderStatus {
                    phase,
                    last_window_at: tokio::time::Instant::now(),
                    windows_closed: windows,
                });
            };
            let mut phase = RecorderPhase::Sampling;
            publish(phase, windows_closed);

            let mut boundary =
                tokio::time::interval_at(tokio::time::Instant::now() + self.interval, self.interval);
            boundary.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    received = chunks.recv() => match received {
                        Ok(chunk) => {
                            if (self.gain - 1.0).abs() > f32::EPSILON {
                                samples.extend(chunk.iter().map(|s| s * self.gain));
                            } else {
                                samples.extend_from_slice(&chunk);
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!("Capture stream lagged, dropped {} chunks", n);
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            info!("Capture stream closed, recorder stopping");
                            break;
                        }
                    },
                    _ = boundary.tick() => {
                        let window =
                            AudioWindow::new(std::mem::take(&mut samples), window_started);
                        window_started = std::time::Instant::now();
                        windows_closed += 1;

                        phase = self.handle_window(window, phase, &transcript_tx);
                        publish(phase, windows_closed);
                    }
                }
            }
        });

        RecorderHandle {
            transcripts: transcript_rx,
            status: status_rx,
            interval,
            task,
        }
    }

    fn handle_window(
        &mut self,
        window: AudioWindow,
        phase: RecorderPhase,
        transcript_tx: &mpsc::Sender<TranscriptEvent>,
    ) -> RecorderPhase {
        if window.is_empty() {
            debug!("Window closed with no samples, skipping");
            return phase;
        }

        if !self.gate.is_calibrated() {
            self.gate.observe_for_calibration(&window);
            if self.gate.is_calibrated() {
                info!("Recorder ready, monitoring for speech");
                return RecorderPhase::Ready;
            }
            return RecorderPhase::Calibrating;
        }

        match self.gate.classify(&window) {
            WindowClass::Silence => {
                debug!(
                    "Discarding silent window ({} ms, peak {:.4})",
                    window.duration_ms(self.sample_rate),
                    window.peak
                );
            }
            WindowClass::Speech => {
                info!(
                    "Speech detected ({} ms, peak {:.4}), transcribing",
                    window.duration_ms(self.sample_rate),
                    window.peak
                );
                self.spawn_transcription(window, transcript_tx.clone());
            }
        }
        RecorderPhase::Ready
    }

    fn spawn_transcription(&self, window: AudioWindow, tx: mpsc::Sender<TranscriptEvent>) {
        let transcriber = Arc::clone(&self.transcriber);
        let language = self.language.clone();
        let timeout = self.transcription_timeout;

        tokio::spawn(async move {
            let outcome = tokio::time::timeout(
                timeout,
                tokio::task::spawn_blocking(move || transcriber.transcribe(&window, &language)),
            )
            .await;

            match outcome {
                Ok(Ok(Ok(Some(text)))) => {
                    info!("Transcription result: '{}'", text);
                    if tx.send(TranscriptEvent::recognized(text)).await.is_err() {
                        debug!("Transcript receiver dropped, discarding result");
                    }
                }
                Ok(Ok(Ok(None))) => debug!("Transcriber recognized no text"),
                Ok(Ok(Err(e))) => warn!("Transcription error: {}", e),
                Ok(Err(e)) => warn!("Transcription task failed: {}", e),
                Err(_) => warn!("Transcription timed out after {:?}", timeout),
            }
        });
    }
}
