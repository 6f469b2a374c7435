use serde::{Deserialize, Serialize};

/// Top-level session phase. Exactly one value is live at a time; only the
/// session controller mutates it, the status renderer reads it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Calibrating,
    Monitoring,
    Capturing,
    Speaking,
    ShuttingDown,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SessionState::Calibrating => "calibrating",
            SessionState::Monitoring => "monitoring",
            SessionState::Capturing => "capturing",
            SessionState::Speaking => "speaking",
            SessionState::ShuttingDown => "shutting down",
        };
        write!(f, "{}", label)
    }
}

/// Text recognized from one speech-classified audio window. Produced by the
/// transcription task, consumed once by the trigger detector.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TranscriptEvent {
    pub text: String,
}

impl TranscriptEvent {
    pub fn recognized(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A single grayscale camera frame. `pixels` holds `width * height` bytes,
/// row-major.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FrameImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl FrameImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.is_empty()
    }
}
