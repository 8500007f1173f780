//! Advisor configuration
//!
//! Persisted with the rest of [`crate::core::Settings`]; the API key is read
//! from the environment only and never written to disk.
//!
//! # Environment
//!
//! | Variable | Purpose |
//! |----------|---------|
//! | `GEMINI_API_KEY` | API key for the generative-language endpoint |
//! | `API_KEY` | Fallback name for the same key |

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default model for suggestions and chat
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Default REST endpoint
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Settings for the move-suggestion and chat assistant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Master switch; a disabled advisor never makes a request
    pub enabled: bool,

    pub model: String,

    pub endpoint: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 10,
            api_key: None,
        }
    }
}

impl AdvisorConfig {
    /// Fill `api_key` from the environment if it is not already set
    pub fn with_env_key(mut self) -> Self {
        if self.api_key.is_none() {
            self.api_key = API_KEY_VARS
                .iter()
                .find_map(|name| std::env::var(name).ok())
                .filter(|key| !key.trim().is_empty());
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Enabled and holding a key
    pub fn is_usable(&self) -> bool {
        self.enabled && self.api_key.is_some()
    }
}
