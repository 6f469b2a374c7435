pub mod gate;

pub use gate::{NoiseProfile, VoiceActivityGate, WindowClass};
