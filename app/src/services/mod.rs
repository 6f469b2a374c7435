pub mod external;

use shared::{FrameImage, ServiceError};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;
use tracing::warn;

use crate::audio::AudioWindow;

/// Speech-to-text backend. Failures and empty recognitions are both
/// neutral: the monitoring loop just moves on to the next window.
pub trait Transcriber: Send + Sync {
    fn transcribe(&self, window: &AudioWindow, language: &str)
        -> Result<Option<String>, ServiceError>;
}

/// Fast, low-accuracy OCR used for per-frame textness scoring.
pub trait FastOcr: Send + Sync {
    fn recognize(&self, frame: &FrameImage) -> Result<String, ServiceError>;
}

/// Slow, high-accuracy OCR run once on the selected frame.
pub trait AccurateOcr: Send + Sync {
    fn extract(&self, frame: &FrameImage) -> Result<Option<String>, ServiceError>;
}

pub trait SpeechSynthesizer: Send + Sync {
    fn synthesize(&self, text: &str) -> Result<SpeechArtifact, ServiceError>;
}

pub trait AudioPlayer: Send + Sync {
    fn play(&self, artifact: &SpeechArtifact) -> Result<(), ServiceError>;
}

/// Live video source. One frame per call; a failed read is recoverable and
/// only skips that selector iteration.
pub trait CameraFeed: Send {
    fn capture(&mut self) -> Result<FrameImage, ServiceError>;
    fn resolution(&self) -> (u32, u32);
}

/// Camera handle shared between the controller and the blocking capture
/// calls, which run on the blocking pool. Locked for one frame grab at a
/// time.
pub type SharedCamera = Arc<Mutex<Box<dyn CameraFeed>>>;

pub fn share_camera(camera: impl CameraFeed + 'static) -> SharedCamera {
    Arc::new(Mutex::new(Box::new(camera)))
}

/// Transient audio file produced by the synthesizer. Removed explicitly
/// after playback via `cleanup`, and by Drop on every other path, so a
/// playback error can never leak the file.
pub struct SpeechArtifact {
    file: NamedTempFile,
}

impl SpeechArtifact {
    /// Create an empty artifact file for a synthesizer to write into.
    pub fn reserve(suffix: &str) -> Result<Self, ServiceError> {
        let file = tempfile::Builder::new()
            .prefix("vocalens-")
            .suffix(suffix)
            .tempfile()?;
        Ok(Self { file })
    }

    pub fn from_bytes(bytes: &[u8], suffix: &str) -> Result<Self, ServiceError> {
        let mut artifact = Self::reserve(suffix)?;
        std::io::Write::write_all(artifact.file.as_file_mut(), bytes)?;
        Ok(artifact)
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn cleanup(self) {
        if let Err(e) = self.file.close() {
            warn!("Failed to remove speech artifact: {}", e);
        }
    }
}

/// Final extracted text plus its synthesized audio, owned by the session
/// controller for the duration of the Speaking state.
pub struct SpokenUtterance {
    pub text: String,
    pub artifact: SpeechArtifact,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_reserve_creates_file() {
        let artifact = SpeechArtifact::reserve(".wav").unwrap();
        assert!(artifact.path().exists());
        assert!(artifact.path().to_string_lossy().ends_with(".wav"));
    }

    #[test]
    fn test_artifact_cleanup_removes_file() {
        let artifact = SpeechArtifact::reserve(".wav").unwrap();
        let path = artifact.path().to_path_buf();
        artifact.cleanup();
        assert!(!path.exists());
    }

    #[test]
    fn test_artifact_removed_on_drop() {
        let path = {
            let artifact = SpeechArtifact::reserve(".wav").unwrap();
            artifact.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_artifact_from_bytes() {
        let artifact = SpeechArtifact::from_bytes(b"RIFF", ".wav").unwrap();
        let contents = std::fs::read(artifact.path()).unwrap();
        assert_eq!(contents, b"RIFF");
    }
}
