//! Client-side session facade

use std::sync::Arc;

use bytes::Bytes;
use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use hyper::{Method, Request, Uri};

use crate::intercept::Interceptor;
use crate::record::{LoggedEvent, RequestRecord};
use crate::session::{SessionId, SessionRegistry};
use crate::stub::{StubEndpoint, StubOutcome, StubResponse};
use crate::{Result, StubnetError};

/// Facade binding a client handle to a session
///
/// Composition stand-in for a real client handle: it owns the handle's
/// default headers, `create_session` stamps the session marker there,
/// and `send` merges them into every outgoing request the way a real
/// client applies default headers. All stub and capture state lives in
/// the registry; the handle holds no private copies.
pub struct StubClient {
    registry: Arc<SessionRegistry>,
    interceptor: Arc<Interceptor>,
    default_headers: HeaderMap,
}

impl StubClient {
    pub(crate) fn new(registry: Arc<SessionRegistry>, interceptor: Arc<Interceptor>) -> Self {
        Self {
            registry,
            interceptor,
            default_headers: HeaderMap::new(),
        }
    }

    /// Create a fresh session and stamp its marker onto this handle
    ///
    /// A second call appends a second marker; every later operation on
    /// the handle then fails with a configuration error rather than
    /// guessing which session was meant.
    ///
    /// # Errors
    ///
    /// Returns error if the session limit is reached
    pub fn create_session(&mut self) -> Result<SessionId> {
        let id = self.registry.create_session()?;
        let marker = HeaderValue::from_str(id.as_str()).map_err(|e| {
            StubnetError::ConfigError(format!("session token is not a valid header value: {e}"))
        })?;
        self.default_headers
            .append(self.interceptor.session_header().clone(), marker);
        Ok(id)
    }

    /// Resolve the session currently stamped onto this handle
    ///
    /// # Errors
    ///
    /// Returns `SessionNotInitialized` if `create_session` was never
    /// called, and a configuration error if it was called twice
    pub fn session_id(&self) -> Result<SessionId> {
        self.interceptor.resolve_session(&self.default_headers)
    }

    /// Declare a stub answering one matching call with a canned response
    ///
    /// `header_matches` lists headers the outgoing request must carry
    /// with exactly those values; `None` means no header constraint.
    ///
    /// # Errors
    ///
    /// Returns error if no session is established on this handle
    pub fn stub_response(
        &self,
        method: Method,
        url: Uri,
        response: StubResponse,
        header_matches: Option<Vec<(HeaderName, HeaderValue)>>,
    ) -> Result<()> {
        self.declare(StubEndpoint::new(
            method,
            url,
            StubOutcome::Respond(response),
            header_matches.unwrap_or_default(),
        ))
    }

    /// Declare a stub failing one matching call with a simulated
    /// transport fault
    ///
    /// # Errors
    ///
    /// Returns error if no session is established on this handle
    pub fn stub_fault(
        &self,
        method: Method,
        url: Uri,
        fault: impl Into<String>,
        header_matches: Option<Vec<(HeaderName, HeaderValue)>>,
    ) -> Result<()> {
        self.declare(StubEndpoint::new(
            method,
            url,
            StubOutcome::Fail(fault.into()),
            header_matches.unwrap_or_default(),
        ))
    }

    fn declare(&self, stub: StubEndpoint) -> Result<()> {
        // Precondition check before any mutation.
        let id = self.session_id()?;
        self.registry.session(&id)?.stubs().declare(stub);
        Ok(())
    }

    /// Issue an outgoing call through the interceptor
    ///
    /// Default headers, including the session marker, are appended to
    /// the request's own headers before interception.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotInitialized` or a configuration error when no
    /// session can be resolved, `NoStubConfigured` when no stub
    /// matches, and the declared `Fault` when a fault stub matches
    pub fn send(&self, request: Request<Bytes>) -> Result<StubResponse> {
        let (parts, body) = request.into_parts();

        let mut headers = parts.headers;
        for (name, value) in &self.default_headers {
            headers.append(name.clone(), value.clone());
        }

        self.interceptor.intercept(RequestRecord {
            method: parts.method,
            url: parts.uri,
            headers,
            body,
        })
    }

    /// Issue a GET with no body
    ///
    /// # Errors
    ///
    /// Same as [`StubClient::send`]
    pub fn get(&self, url: Uri) -> Result<StubResponse> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(url)
            .body(Bytes::new())
            .map_err(|e| StubnetError::ConfigError(format!("failed to build request: {e}")))?;
        self.send(request)
    }

    /// Snapshot of every request captured under this handle's session,
    /// in call order
    ///
    /// # Errors
    ///
    /// Returns error if no session is established on this handle
    pub fn captured_requests(&self) -> Result<Vec<RequestRecord>> {
        let id = self.session_id()?;
        Ok(self.registry.session(&id)?.requests())
    }

    /// Snapshot of every decision event logged under this handle's
    /// session, in call order
    ///
    /// # Errors
    ///
    /// Returns error if no session is established on this handle
    pub fn captured_events(&self) -> Result<Vec<LoggedEvent>> {
        let id = self.session_id()?;
        Ok(self.registry.session(&id)?.events())
    }
}
