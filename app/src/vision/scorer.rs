use regex::Regex;
use shared::FrameImage;
use std::sync::Arc;
use tracing::debug;

use crate::services::FastOcr;

/// Cheap textness estimate for a single frame: the word count of a fast,
/// low-accuracy OCR pass. A failing backend or blank frame scores 0 so one
/// bad frame can never abort a selection window.
pub struct FrameScorer {
    backend: Arc<dyn FastOcr>,
    word: Regex,
}

impl FrameScorer {
    pub fn new(backend: Arc<dyn FastOcr>) -> Self {
        Self {
            backend,
            word: Regex::new(r"\w+").expect("static pattern"),
        }
    }

    pub fn score(&self, frame: &FrameImage) -> u32 {
        self.score_with_text(frame).0
    }

    /// Score plus the raw fast-OCR text, kept as a preview alongside the
    /// best frame.
    pub fn score_with_text(&self, frame: &FrameImage) -> (u32, String) {
        match self.backend.recognize(frame) {
            Ok(text) => {
                let words = self.word.find_iter(&text).count() as u32;
                (words, text)
            }
            Err(e) => {
                debug!("Fast OCR failed, scoring frame 0: {}", e);
                (0, String::new())
            }
        }
    }
}
