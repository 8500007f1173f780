//! Core module - configuration and session lifecycle state
//!
//! # Resources
//!
//! - [`Settings`] - User preferences persisted between runs
//! - [`SessionPhase`] - Lifecycle of a single peer session
//!
//! # Persistence
//!
//! [`settings_persistence`] reads and writes `settings.json` in the platform
//! config directory. Loading never fails; a broken file means defaults.

pub mod error;
pub mod resources;
pub mod settings_persistence;
pub mod states;

// Re-export commonly used items
pub use error::{CoreError, CoreResult};
pub use resources::*;
pub use states::*;
