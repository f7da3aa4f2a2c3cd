//! Error types for Stubnet

use hyper::{Method, Uri};
use thiserror::Error;

/// Result type for Stubnet operations
pub type Result<T> = std::result::Result<T, StubnetError>;

/// Errors that can occur in Stubnet
#[derive(Debug, Error)]
pub enum StubnetError {
    /// An operation required a session but the client handle carries none
    #[error("no session established on this client; call create_session first")]
    SessionNotInitialized,

    /// An outgoing call had no matching stub
    #[error("no stub configured for {method} {url}")]
    NoStubConfigured {
        /// Method of the unmatched call
        method: Method,
        /// Resolved URL of the unmatched call
        url: Uri,
    },

    /// A fault a test intentionally declared for a matching call
    #[error("stubbed transport failure: {0}")]
    Fault(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Session registry refused to create another session
    #[error("session limit reached: {limit}")]
    SessionLimitReached {
        /// Configured session limit
        limit: usize,
    },
}
