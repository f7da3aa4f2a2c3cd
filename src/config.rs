//! Configuration types for Stubnet

use hyper::header::HeaderName;
use serde::{Deserialize, Serialize};

use crate::{Result, StubnetError};

/// Default name of the reserved header carrying the session marker
pub const DEFAULT_SESSION_HEADER: &str = "stubnet-session-id";

/// Default maximum number of concurrent sessions
pub const DEFAULT_MAX_SESSIONS: usize = 1024;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Name of the reserved header used to stamp the session id onto
    /// outgoing requests
    #[serde(default = "default_session_header")]
    pub session_header: String,
    /// Maximum number of concurrent sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_session_header() -> String {
    DEFAULT_SESSION_HEADER.to_string()
}

fn default_max_sessions() -> usize {
    DEFAULT_MAX_SESSIONS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session_header: default_session_header(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl Config {
    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<()> {
        self.session_header_name()?;

        if self.max_sessions == 0 {
            return Err(StubnetError::ConfigError(
                "max_sessions cannot be 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Parse the configured session header name
    ///
    /// # Errors
    ///
    /// Returns error if the name is not a valid HTTP header name
    pub fn session_header_name(&self) -> Result<HeaderName> {
        self.session_header.parse::<HeaderName>().map_err(|e| {
            StubnetError::ConfigError(format!(
                "invalid session header name '{}': {e}",
                self.session_header
            ))
        })
    }
}
