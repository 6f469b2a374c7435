// Common helpers for vocalens integration tests: scripted collaborator
// implementations for the deterministic pipeline tests, and user
// interaction utilities for the ignored hardware tests.
#![allow(dead_code)]

use shared::{FrameImage, ServiceError};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use vocalens::audio::AudioWindow;
use vocalens::services::{
    AccurateOcr, AudioPlayer, CameraFeed, FastOcr, SpeechArtifact, SpeechSynthesizer, Transcriber,
};

/// Always recognizes the same utterance in any speech window.
pub struct FixedTranscriber {
    pub text: String,
    pub calls: AtomicUsize,
}

impl FixedTranscriber {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            calls: AtomicUsize::new(0),
        }
    }
}

impl Transcriber for FixedTranscriber {
    fn transcribe(
        &self,
        _window: &AudioWindow,
        _language: &str,
    ) -> Result<Option<String>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(self.text.clone()))
    }
}

/// Yields one tagged frame per capture (tag in the first pixel), then
/// fails every further read. The capture count is shared so tests can
/// observe it after the camera moves into the session task.
pub struct ScriptedCamera {
    frames: Mutex<Vec<FrameImage>>,
    captures: Arc<AtomicUsize>,
}

impl ScriptedCamera {
    pub fn tagged(count: u8) -> Self {
        let frames = (0..count)
            .map(|i| FrameImage::new(2, 2, vec![i, 0, 0, 0]))
            .collect();
        Self {
            frames: Mutex::new(frames),
            captures: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn capture_count(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.captures)
    }
}

impl CameraFeed for ScriptedCamera {
    fn capture(&mut self) -> Result<FrameImage, ServiceError> {
        let mut frames = self.frames.lock().unwrap();
        if frames.is_empty() {
            return Err(ServiceError::Capture("feed exhausted".to_string()));
        }
        self.captures.fetch_add(1, Ordering::SeqCst);
        Ok(frames.remove(0))
    }

    fn resolution(&self) -> (u32, u32) {
        (2, 2)
    }
}

/// Scores frames by looking up the tag pixel in a fixed table.
pub struct TaggedOcr {
    pub scores: Vec<u32>,
}

impl FastOcr for TaggedOcr {
    fn recognize(&self, frame: &FrameImage) -> Result<String, ServiceError> {
        let tag = frame.pixels[0] as usize;
        let words = self.scores.get(tag).copied().unwrap_or(0);
        Ok(vec!["word"; words as usize].join(" "))
    }
}

/// Returns fixed text and remembers which frame tag it was asked about.
pub struct RecordingAccurateOcr {
    pub text: Option<String>,
    pub seen_tags: Mutex<Vec<u8>>,
}

impl RecordingAccurateOcr {
    pub fn returning(text: Option<&str>) -> Self {
        Self {
            text: text.map(String::from),
            seen_tags: Mutex::new(Vec::new()),
        }
    }
}

impl AccurateOcr for RecordingAccurateOcr {
    fn extract(&self, frame: &FrameImage) -> Result<Option<String>, ServiceError> {
        self.seen_tags.lock().unwrap().push(frame.pixels[0]);
        Ok(self.text.clone())
    }
}

/// Creates real temp artifacts and remembers their paths.
pub struct RecordingSynthesizer {
    pub calls: AtomicUsize,
    pub last_path: Mutex<Option<PathBuf>>,
}

impl RecordingSynthesizer {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            last_path: Mutex::new(None),
        }
    }
}

impl SpeechSynthesizer for RecordingSynthesizer {
    fn synthesize(&self, _text: &str) -> Result<SpeechArtifact, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let artifact = SpeechArtifact::reserve(".wav")?;
        *self.last_path.lock().unwrap() = Some(artifact.path().to_path_buf());
        Ok(artifact)
    }
}

pub struct CountingPlayer {
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl CountingPlayer {
    pub fn new(fail: bool) -> Self {
        Self {
            fail,
            calls: AtomicUsize::new(0),
        }
    }
}

impl AudioPlayer for CountingPlayer {
    fn play(&self, artifact: &SpeechArtifact) -> Result<(), ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(artifact.path().exists());
        if self.fail {
            Err(ServiceError::Playback("device busy".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Ask user to confirm an action (hardware tests only).
pub fn confirm_action(prompt: &str) -> bool {
    print!(
        "\n[CONFIRM] {}\nPress 'y' to confirm, any other key to skip: ",
        prompt
    );
    io::stdout().flush().unwrap();

    let mut input = String::new();
    io::stdin().read_line(&mut input).unwrap();

    input.trim().to_lowercase() == "y"
}

/// Pause and wait for user to press Enter.
pub fn wait_for_user(prompt: &str) {
    println!("\n[PAUSE] {}", prompt);
    print!("Press Enter to continue...");
    io::stdout().flush().unwrap();

    let mut input = String::new();
    io::stdin().read_line(&mut input).unwrap();
}

/// Print a section header.
pub fn print_header(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("  {}", title);
    println!("{}", "=".repeat(60));
}

pub fn print_success(message: &str) {
    println!("\n✓ {}", message);
}

pub fn print_error(message: &str) {
    println!("\n✗ {}", message);
}

pub fn print_info(message: &str) {
    println!("\nℹ {}", message);
}
