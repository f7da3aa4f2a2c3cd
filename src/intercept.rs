//! Interception of outgoing calls

use std::sync::Arc;

use hyper::header::{HeaderMap, HeaderName};
use tracing::{debug, warn};

use crate::record::{EventLevel, LoggedEvent, MatchDecision, RequestRecord};
use crate::session::{SessionId, SessionRegistry};
use crate::stub::{MatchResult, StubOutcome, StubResponse};
use crate::{Result, StubnetError};

/// The extension point a real client invokes for every outgoing call
///
/// An implementation answers the call entirely; no real I/O happens
/// once it decides.
pub trait Transport: Send + Sync {
    /// Answer one outgoing call
    ///
    /// # Errors
    ///
    /// Returns error if the call cannot be answered with a canned
    /// response
    fn round_trip(&self, request: RequestRecord) -> Result<StubResponse>;
}

/// Substitutes stub decisions for real network round-trips
pub struct Interceptor {
    registry: Arc<SessionRegistry>,
    session_header: HeaderName,
}

impl Interceptor {
    /// Create an interceptor over a registry, resolving sessions from
    /// the given reserved header
    #[must_use]
    pub fn new(registry: Arc<SessionRegistry>, session_header: HeaderName) -> Self {
        Self {
            registry,
            session_header,
        }
    }

    /// Name of the reserved session marker header
    #[must_use]
    pub fn session_header(&self) -> &HeaderName {
        &self.session_header
    }

    /// Extract the session id stamped onto a set of headers
    ///
    /// # Errors
    ///
    /// Returns `SessionNotInitialized` if no marker is present, and a
    /// configuration error if more than one is
    pub fn resolve_session(&self, headers: &HeaderMap) -> Result<SessionId> {
        let mut markers = headers.get_all(&self.session_header).iter();

        let first = markers.next().ok_or(StubnetError::SessionNotInitialized)?;
        if markers.next().is_some() {
            return Err(StubnetError::ConfigError(format!(
                "multiple {} markers present; create_session was called more than once",
                self.session_header
            )));
        }

        let token = first.to_str().map_err(|_| {
            StubnetError::ConfigError(format!(
                "session marker in {} is not printable ASCII",
                self.session_header
            ))
        })?;

        Ok(SessionId::from(token))
    }

    /// Decide the outcome of one outgoing call, terminal in one pass
    ///
    /// Appends the request snapshot and a decision event to the
    /// session's capture logs, then returns the canned response or the
    /// declared fault.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotInitialized` or a configuration error when no
    /// session can be resolved, `NoStubConfigured` when no stub
    /// matches, and the declared `Fault` when a fault stub matches
    pub fn intercept(&self, request: RequestRecord) -> Result<StubResponse> {
        let session_id = self.resolve_session(&request.headers)?;
        let state = self.registry.session(&session_id)?;

        // Captured whether or not a stub matches.
        state.record_request(request.clone());

        match state.stubs().find_and_consume(&request) {
            MatchResult::Matched {
                stub_index,
                outcome,
            } => {
                let message = format!(
                    "matched stub {stub_index} for {} {}",
                    request.method, request.url
                );
                debug!("{message} (session: {session_id})");
                state.push_event(LoggedEvent::now(
                    EventLevel::Info,
                    MatchDecision::Matched { stub_index },
                    message,
                ));

                match outcome {
                    StubOutcome::Respond(response) => Ok(response),
                    StubOutcome::Fail(fault) => Err(StubnetError::Fault(fault)),
                }
            }
            MatchResult::NoMatch => {
                let message = format!(
                    "no stub configured for {} {}",
                    request.method, request.url
                );
                warn!("{message} (session: {session_id})");
                state.push_event(LoggedEvent::now(
                    EventLevel::Warn,
                    MatchDecision::Unmatched,
                    message,
                ));

                Err(StubnetError::NoStubConfigured {
                    method: request.method,
                    url: request.url,
                })
            }
        }
    }
}

impl Transport for Interceptor {
    fn round_trip(&self, request: RequestRecord) -> Result<StubResponse> {
        self.intercept(request)
    }
}
