pub mod capture;
pub mod recorder;
pub mod window;

pub use capture::MicrophoneCapture;
pub use recorder::{ContinuousRecorder, RecorderHandle, RecorderPhase, RecorderStatus};
pub use window::AudioWindow;
