//! Move advisor
//!
//! Optional assistant that proposes hops and chats about the position.
//!
//! # Architecture
//!
//! - `AdvisorConfig`: persisted settings plus the API key from the environment
//! - `Advisor`: async trait for one-shot suggestions (`GeminiAdvisor`, `NoAdvisor`)
//! - `AdvisorChat`: conversation with in-memory turn history
//!
//! Requests run off the session loop; the session only ever sees results that
//! went through `vet_suggestion`, so the advisor cannot produce an illegal move.

pub mod client;
pub mod resource;

// Re-export for convenience
pub use client::{
    build_advisor, vet_suggestion, Advisor, AdvisorChat, GeminiAdvisor, NoAdvisor, SquareRef,
    Suggestion, CHAT_FALLBACK,
};
pub use resource::AdvisorConfig;
