//! Persisted user settings
//!
//! Values here survive between runs; see [`crate::core::settings_persistence`]
//! for where they live on disk. CLI flags override them per invocation.

use crate::core::error::{CoreError, CoreResult};
use crate::game::ai::AdvisorConfig;
use draughts_engine::{CaptureRule, RuleSet};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Default TCP port for hosting a match
pub const DEFAULT_PORT: u16 = 7878;

/// User preferences loaded at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Name shown to the opponent
    pub player_name: String,

    /// Address the host binds to
    pub listen_addr: String,

    /// Whether hosted matches force captures when one is available
    pub strict_capture: bool,

    /// Move-suggestion and chat assistant
    pub advisor: AdvisorConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            player_name: "Player".to_string(),
            listen_addr: format!("0.0.0.0:{}", DEFAULT_PORT),
            strict_capture: false,
            advisor: AdvisorConfig::default(),
        }
    }
}

impl Settings {
    /// Rule set a hosted match is played under
    pub fn rules(&self) -> RuleSet {
        RuleSet {
            capture: if self.strict_capture {
                CaptureRule::Mandatory
            } else {
                CaptureRule::Optional
            },
        }
    }

    pub fn listen_socket(&self) -> CoreResult<SocketAddr> {
        self.listen_addr
            .parse()
            .map_err(|e: std::net::AddrParseError| CoreError::InvalidSetting {
                key: "listen_addr",
                message: e.to_string(),
            })
    }

    /// Reject settings the session layer cannot run with
    pub fn validate(&self) -> CoreResult<()> {
        if self.player_name.trim().is_empty() {
            return Err(CoreError::InvalidSetting {
                key: "player_name",
                message: "must not be empty".to_string(),
            });
        }
        self.listen_socket()?;
        if self.advisor.timeout_secs == 0 {
            return Err(CoreError::InvalidSetting {
                key: "advisor.timeout_secs",
                message: "must be at least one second".to_string(),
            });
        }
        Ok(())
    }
}
