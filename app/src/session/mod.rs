pub mod controller;
pub mod render;

pub use controller::{SessionController, SessionServices};
pub use render::StatusRenderer;
