use shared::SessionState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::audio::RecorderHandle;
use crate::config::Config;
use crate::services::{
    AccurateOcr, AudioPlayer, SharedCamera, SpeechSynthesizer, SpokenUtterance,
};
use crate::session::StatusRenderer;
use crate::trigger::TriggerDetector;
use crate::vision::{BestFrameSelector, SelectedFrame, Selection};

/// Collaborators the controller sequences after a trigger fires. The
/// transcriber is not here: it belongs to the recorder's side of the
/// pipeline.
pub struct SessionServices {
    pub accurate_ocr: Arc<dyn AccurateOcr>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub player: Arc<dyn AudioPlayer>,
}

/// Top-level orchestrator. Owns the session state machine and the control
/// loop; everything slow it does happens inside Capturing or Speaking, so
/// the audio pipeline keeps its own schedule throughout.
pub struct SessionController {
    trigger: TriggerDetector,
    selector: BestFrameSelector,
    services: SessionServices,
    renderer: StatusRenderer,
    state_tx: watch::Sender<SessionState>,
    refresh: Duration,
    synthesis_timeout: Duration,
    pending_text: Option<String>,
}

impl SessionController {
    pub fn new(
        config: &Config,
        trigger: TriggerDetector,
        selector: BestFrameSelector,
        services: SessionServices,
        renderer: StatusRenderer,
    ) -> (Self, watch::Receiver<SessionState>) {
        let (state_tx, state_rx) = watch::channel(SessionState::Calibrating);
        (
            Self {
                trigger,
                selector,
                services,
                renderer,
                state_tx,
                refresh: Duration::from_millis(config.render.refresh_ms.max(50)),
                synthesis_timeout: Duration::from_secs(config.timeouts.synthesis_seconds),
                pending_text: None,
            },
            state_rx,
        )
    }

    fn transition(&mut self, from: SessionState, to: SessionState) -> SessionState {
        info!("Session state: {} -> {}", from, to);
        let _ = self.state_tx.send(to);
        to
    }

    pub async fn run(
        mut self,
        camera: SharedCamera,
        mut recorder: RecorderHandle,
        quit: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let mut state = SessionState::Calibrating;
        let _ = self.state_tx.send(state);
        info!("Session started, waiting for noise calibration");

        let mut quit_watch = quit.clone();

        loop {
            if *quit.borrow() && state != SessionState::ShuttingDown {
                state = self.transition(state, SessionState::ShuttingDown);
            }

            match state {
                SessionState::Calibrating => {
                    let windows = recorder.status.borrow().windows_closed;
                    self.renderer.calibrating(windows);

                    if recorder.is_ready() {
                        info!("Calibration complete, monitoring for trigger phrases");
                        state = self.transition(state, SessionState::Monitoring);
                        continue;
                    }

                    tokio::select! {
                        changed = recorder.status.changed() => {
                            if changed.is_err() {
                                warn!("Recorder ended during calibration");
                                state = self.transition(state, SessionState::ShuttingDown);
                            }
                        }
                        _ = quit_watch.changed() => {}
                    }
                }
                SessionState::Monitoring => {
                    self.renderer
                        .monitoring(recorder.seconds_until_next_window());

                    tokio::select! {
                        event = recorder.transcripts.recv() => match event {
                            Some(event) => {
                                if !event.is_empty() && self.trigger.matches(&event.text) {
                                    state = self.transition(state, SessionState::Capturing);
                                }
                            }
                            None => {
                                warn!("Transcript channel closed, ending session");
                                state = self.transition(state, SessionState::ShuttingDown);
                            }
                        },
                        _ = tokio::time::sleep(self.refresh) => {}
                        _ = quit_watch.changed() => {}
                    }
                }
                SessionState::Capturing => {
                    let selection = self
                        .selector
                        .select(&camera, &quit, &mut self.renderer)
                        .await;

                    state = match selection {
                        Selection::NoText => {
                            info!("No text found, resuming monitoring");
                            self.transition(state, SessionState::Monitoring)
                        }
                        Selection::Frame(selected) => match self.extract_text(selected).await {
                            Some(text) => {
                                self.pending_text = Some(text);
                                self.transition(state, SessionState::Speaking)
                            }
                            None => {
                                info!("No text found in selected frame, resuming monitoring");
                                self.transition(state, SessionState::Monitoring)
                            }
                        },
                    };
                }
                SessionState::Speaking => {
                    self.renderer.speaking();
                    if let Some(text) = self.pending_text.take() {
                        self.speak(text, &quit).await;
                    }
                    state = self.transition(state, SessionState::Monitoring);
                }
                SessionState::ShuttingDown => break,
            }
        }

        self.renderer.finish();
        info!("Session shutting down");
        recorder.stop().await;
        Ok(())
    }

    /// Accurate OCR pass over the selected frame. Any failure is the
    /// "no text found" outcome, never fatal.
    async fn extract_text(&self, selected: SelectedFrame) -> Option<String> {
        debug!(
            "Selected frame scored {} (fast preview: '{}')",
            selected.score, selected.preview_text
        );

        let ocr = Arc::clone(&self.services.accurate_ocr);
        let outcome = tokio::task::spawn_blocking(move || ocr.extract(&selected.frame)).await;

        match outcome {
            Ok(Ok(Some(text))) if !text.trim().is_empty() => {
                info!("OCR result: '{}'", text);
                Some(text)
            }
            Ok(Ok(_)) => None,
            Ok(Err(e)) => {
                warn!("Accurate OCR failed: {}", e);
                None
            }
            Err(e) => {
                warn!("OCR task failed: {}", e);
                None
            }
        }
    }

    /// Synthesize and play one utterance. The audio artifact is removed on
    /// every path out of here, including playback failure and quit.
    async fn speak(&self, text: String, quit: &watch::Receiver<bool>) {
        let synthesizer = Arc::clone(&self.services.synthesizer);
        let to_speak = text.clone();
        let outcome = tokio::time::timeout(
            self.synthesis_timeout,
            tokio::task::spawn_blocking(move || synthesizer.synthesize(&to_speak)),
        )
        .await;

        let artifact = match outcome {
            Ok(Ok(Ok(artifact))) => artifact,
            Ok(Ok(Err(e))) => {
                warn!("Speech synthesis failed, skipping playback: {}", e);
                return;
            }
            Ok(Err(e)) => {
                warn!("Synthesis task failed: {}", e);
                return;
            }
            Err(_) => {
                warn!("Speech synthesis timed out after {:?}", self.synthesis_timeout);
                return;
            }
        };

        let utterance = SpokenUtterance { text, artifact };

        if *quit.borrow() {
            utterance.artifact.cleanup();
            return;
        }

        let player = Arc::clone(&self.services.player);
        let played = tokio::task::spawn_blocking(move || {
            let result = player.play(&utterance.artifact);
            (utterance.artifact, result)
        })
        .await;

        match played {
            Ok((artifact, Ok(()))) => {
                debug!("Playback complete");
                artifact.cleanup();
            }
            Ok((artifact, Err(e))) => {
                warn!("Playback failed: {}", e);
                artifact.cleanup();
            }
            // the artifact was dropped inside the failed task; Drop has
            // already removed the file
            Err(e) => warn!("Playback task failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{FastOcr, SpeechArtifact};
    use crate::vision::FrameScorer;
    use shared::{FrameImage, ServiceError};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct NullOcr;
    impl FastOcr for NullOcr {
        fn recognize(&self, _: &FrameImage) -> Result<String, ServiceError> {
            Ok(String::new())
        }
    }
    impl AccurateOcr for NullOcr {
        fn extract(&self, _: &FrameImage) -> Result<Option<String>, ServiceError> {
            Ok(None)
        }
    }

    struct RecordingSynthesizer {
        fail: bool,
        last_path: Mutex<Option<PathBuf>>,
    }

    impl SpeechSynthesizer for RecordingSynthesizer {
        fn synthesize(&self, _text: &str) -> Result<SpeechArtifact, ServiceError> {
            if self.fail {
                return Err(ServiceError::Synthesis("engine down".to_string()));
            }
            let artifact = SpeechArtifact::reserve(".wav")?;
            *self.last_path.lock().unwrap() = Some(artifact.path().to_path_buf());
            Ok(artifact)
        }
    }

    struct ScriptedPlayer {
        fail: bool,
        calls: AtomicUsize,
    }

    impl AudioPlayer for ScriptedPlayer {
        fn play(&self, artifact: &SpeechArtifact) -> Result<(), ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(artifact.path().exists(), "artifact must exist during playback");
            if self.fail {
                Err(ServiceError::Playback("device busy".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn controller(
        synthesizer: Arc<RecordingSynthesizer>,
        player: Arc<ScriptedPlayer>,
    ) -> SessionController {
        let config = Config::default();
        let services = SessionServices {
            accurate_ocr: Arc::new(NullOcr),
            synthesizer,
            player,
        };
        let selector = BestFrameSelector::new(
            FrameScorer::new(Arc::new(NullOcr)),
            Duration::from_secs(1),
            Duration::from_millis(50),
        );
        let trigger = TriggerDetector::from_config(&config.trigger);
        let (controller, _state_rx) = SessionController::new(
            &config,
            trigger,
            selector,
            services,
            StatusRenderer::new(false),
        );
        controller
    }

    #[tokio::test]
    async fn test_playback_failure_still_deletes_artifact() {
        let synthesizer = Arc::new(RecordingSynthesizer {
            fail: false,
            last_path: Mutex::new(None),
        });
        let player = Arc::new(ScriptedPlayer {
            fail: true,
            calls: AtomicUsize::new(0),
        });
        let controller = controller(synthesizer.clone(), player.clone());
        let (_quit_tx, quit) = watch::channel(false);

        controller.speak("hello world".to_string(), &quit).await;

        assert_eq!(player.calls.load(Ordering::SeqCst), 1);
        let path = synthesizer.last_path.lock().unwrap().clone().unwrap();
        assert!(!path.exists(), "artifact must be removed after failed playback");
    }

    #[tokio::test]
    async fn test_successful_playback_deletes_artifact() {
        let synthesizer = Arc::new(RecordingSynthesizer {
            fail: false,
            last_path: Mutex::new(None),
        });
        let player = Arc::new(ScriptedPlayer {
            fail: false,
            calls: AtomicUsize::new(0),
        });
        let controller = controller(synthesizer.clone(), player.clone());
        let (_quit_tx, quit) = watch::channel(false);

        controller.speak("hello".to_string(), &quit).await;

        assert_eq!(player.calls.load(Ordering::SeqCst), 1);
        let path = synthesizer.last_path.lock().unwrap().clone().unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_synthesis_failure_skips_playback() {
        let synthesizer = Arc::new(RecordingSynthesizer {
            fail: true,
            last_path: Mutex::new(None),
        });
        let player = Arc::new(ScriptedPlayer {
            fail: false,
            calls: AtomicUsize::new(0),
        });
        let controller = controller(synthesizer.clone(), player.clone());
        let (_quit_tx, quit) = watch::channel(false);

        controller.speak("hello".to_string(), &quit).await;

        assert_eq!(player.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_quit_before_playback_deletes_artifact() {
        let synthesizer = Arc::new(RecordingSynthesizer {
            fail: false,
            last_path: Mutex::new(None),
        });
        let player = Arc::new(ScriptedPlayer {
            fail: false,
            calls: AtomicUsize::new(0),
        });
        let controller = controller(synthesizer.clone(), player.clone());
        let (_quit_tx, quit) = watch::channel(true);

        controller.speak("hello".to_string(), &quit).await;

        assert_eq!(player.calls.load(Ordering::SeqCst), 0);
        let path = synthesizer.last_path.lock().unwrap().clone().unwrap();
        assert!(!path.exists());
    }
}
