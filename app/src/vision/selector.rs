use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use shared::{FrameImage, ServiceError};

use crate::services::SharedCamera;
use crate::session::StatusRenderer;
use crate::vision::FrameScorer;

/// The one frame that survived a capture window, with its score and the
/// fast-OCR text snapshot that earned it.
#[derive(Debug, Clone)]
pub struct SelectedFrame {
    pub frame: FrameImage,
    pub captured_at: Instant,
    pub score: u32,
    pub preview_text: String,
}

/// Outcome of a capture window. `NoText` is a distinguished empty result,
/// not an error: every frame scored zero.
#[derive(Debug)]
pub enum Selection {
    Frame(SelectedFrame),
    NoText,
}

/// Drives the bounded capture loop: score every frame the camera yields
/// inside the window, retain the best one. Ties keep the earliest frame,
/// so only a strictly better score replaces the current best.
pub struct BestFrameSelector {
    scorer: Arc<FrameScorer>,
    window: Duration,
    frame_retry: Duration,
}

impl BestFrameSelector {
    pub fn new(scorer: FrameScorer, window: Duration, frame_retry: Duration) -> Self {
        Self {
            scorer: Arc::new(scorer),
            window,
            frame_retry,
        }
    }

    pub async fn select(
        &self,
        camera: &SharedCamera,
        quit: &watch::Receiver<bool>,
        renderer: &mut StatusRenderer,
    ) -> Selection {
        let deadline = tokio::time::Instant::now() + self.window;
        let mut best: Option<SelectedFrame> = None;
        let mut frames_scanned: u64 = 0;

        info!(
            "Capturing frames for {:?} to find readable text",
            self.window
        );

        while tokio::time::Instant::now() < deadline {
            if *quit.borrow() {
                info!("Quit requested, abandoning capture window");
                break;
            }

            renderer.searching(frames_scanned, best.as_ref().map(|b| b.score).unwrap_or(0));

            // the grab and the fast-OCR pass both block, so they run on
            // the blocking pool and never stall the audio side
            let camera = Arc::clone(camera);
            let scorer = Arc::clone(&self.scorer);
            let scored = tokio::task::spawn_blocking(move || {
                let mut camera = camera.lock().unwrap();
                let frame = camera.capture()?;
                let (score, preview_text) = scorer.score_with_text(&frame);
                Ok::<_, ServiceError>((frame, score, preview_text))
            })
            .await;

            let (frame, score, preview_text) = match scored {
                Ok(Ok(result)) => result,
                Ok(Err(e)) => {
                    debug!("Frame read failed, retrying: {}", e);
                    tokio::time::sleep(self.frame_retry).await;
                    continue;
                }
                Err(e) => {
                    warn!("Frame scoring task failed: {}", e);
                    tokio::time::sleep(self.frame_retry).await;
                    continue;
                }
            };
            frames_scanned += 1;

            let current_best = best.as_ref().map(|b| b.score).unwrap_or(0);
            if score > current_best {
                info!(
                    "Frame {}: found {} words, new best frame",
                    frames_scanned, score
                );
                best = Some(SelectedFrame {
                    frame,
                    captured_at: Instant::now(),
                    score,
                    preview_text,
                });
            }
        }

        match best {
            Some(selected) => {
                info!(
                    "Best frame scored {} words over {} frames",
                    selected.score, frames_scanned
                );
                Selection::Frame(selected)
            }
            None => {
                info!("No frame contained text ({} frames scanned)", frames_scanned);
                Selection::NoText
            }
        }
    }
}
