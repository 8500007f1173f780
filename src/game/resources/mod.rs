//! Per-match bookkeeping owned by a session

pub mod history;

pub use history::{MoveHistory, MoveRecord};
