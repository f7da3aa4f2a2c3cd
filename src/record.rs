//! Immutable capture records for outgoing requests and decisions

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use hyper::header::HeaderMap;
use hyper::{Method, Uri};

/// Immutable snapshot of one outgoing request
///
/// Captured at interception time whether or not a stub matched; used
/// purely for later assertions.
#[derive(Debug, Clone)]
pub struct RequestRecord {
    /// HTTP method
    pub method: Method,
    /// Resolved request URL
    pub url: Uri,
    /// Request headers, including the handle's default headers
    pub headers: HeaderMap,
    /// Request body
    pub body: Bytes,
}

/// Severity of a logged decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    /// Expected outcome
    Info,
    /// Missing test setup
    Warn,
}

/// What the interceptor decided for one outgoing call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchDecision {
    /// A stub matched and was consumed
    Matched {
        /// Declaration-order index of the consumed stub
        stub_index: usize,
    },
    /// No unconsumed stub matched
    Unmatched,
}

/// Append-only record of one interception decision
#[derive(Debug, Clone)]
pub struct LoggedEvent {
    /// When the decision was made
    pub timestamp: SystemTime,
    /// Severity
    pub level: EventLevel,
    /// Match outcome
    pub decision: MatchDecision,
    /// Human-readable description of the decision
    pub message: String,
}

impl LoggedEvent {
    /// Create an event stamped with the current time
    #[must_use]
    pub fn now(level: EventLevel, decision: MatchDecision, message: String) -> Self {
        Self {
            timestamp: SystemTime::now(),
            level,
            decision,
            message,
        }
    }
}

impl fmt::Display for LoggedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let since_epoch = self
            .timestamp
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let level = match self.level {
            EventLevel::Info => "INFO",
            EventLevel::Warn => "WARN",
        };
        write!(
            f,
            "[{}.{:03}] {} {}",
            since_epoch.as_secs(),
            since_epoch.subsec_millis(),
            level,
            self.message
        )
    }
}

/// Render captured events one per line, for test failure output
#[must_use]
pub fn render_events(events: &[LoggedEvent]) -> String {
    let mut out = String::new();
    for event in events {
        out.push_str(&event.to_string());
        out.push('\n');
    }
    out
}
