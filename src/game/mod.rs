//! Game module - session-side game bookkeeping
//!
//! - `ai` - Move advisor and chat assistant
//! - `error` - Session error type
//! - `events` - Notifications published to subscribers
//! - `resources` - Move history

pub mod ai;
pub mod error;
pub mod events;
pub mod resources;

pub use error::{SessionError, SessionResult};
pub use events::SessionEvent;
pub use resources::{MoveHistory, MoveRecord};
