pub mod scorer;
pub mod selector;

pub use scorer::FrameScorer;
pub use selector::{BestFrameSelector, SelectedFrame, Selection};
