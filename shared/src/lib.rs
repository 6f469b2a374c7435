pub mod error;
pub mod types;

pub use error::{DeviceError, ServiceError};
pub use types::{FrameImage, SessionState, TranscriptEvent};
