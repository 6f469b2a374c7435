use thiserror::Error;

/// Loss of core sensing hardware. Fatal at startup: the process exits
/// non-zero instead of running a session that can never capture anything.
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("no microphone input device available")]
    MicrophoneUnavailable,

    #[error("audio stream configuration unsupported: {0}")]
    AudioConfig(String),

    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),
}

/// A downstream collaborator failed. Always recovered locally: the state
/// machine treats the result as empty/neutral and keeps running.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("transcription failed: {0}")]
    Transcription(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("audio playback failed: {0}")]
    Playback(String),

    #[error("camera capture failed: {0}")]
    Capture(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
