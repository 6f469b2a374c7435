pub mod audio;
pub mod config;
pub mod services;
pub mod session;
pub mod trigger;
pub mod vad;
pub mod vision;

pub use audio::capture::MicrophoneCapture;
pub use audio::recorder::{ContinuousRecorder, RecorderHandle};
pub use session::controller::SessionController;
pub use trigger::TriggerDetector;
pub use vad::gate::VoiceActivityGate;
pub use vision::selector::{BestFrameSelector, Selection};
