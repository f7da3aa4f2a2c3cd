//! Canned response construction helpers

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use hyper::{Response, StatusCode};

use crate::stub::StubResponse;

/// Convenience factory for canned responses
///
/// Not required by the matching engine; stubs accept any
/// [`StubResponse`] built by hand.
pub struct ResponseFactory;

impl ResponseFactory {
    /// A 200 response with a plain-text body
    #[must_use]
    pub fn ok(body: impl Into<Bytes>) -> StubResponse {
        Self::text(StatusCode::OK, body)
    }

    /// A response with a `text/plain` body
    #[must_use]
    pub fn text(status: StatusCode, body: impl Into<Bytes>) -> StubResponse {
        let mut response = Self::status(status);
        response
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        response.body = body.into();
        response
    }

    /// A response with an `application/json` body
    #[must_use]
    pub fn json(status: StatusCode, body: impl Into<Bytes>) -> StubResponse {
        let mut response = Self::status(status);
        response
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response.body = body.into();
        response
    }

    /// A bare response with the given status and no body
    #[must_use]
    pub fn status(status: StatusCode) -> StubResponse {
        StubResponse {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }
}

impl From<StubResponse> for Response<Full<Bytes>> {
    fn from(stub: StubResponse) -> Self {
        let mut response = Response::new(Full::new(stub.body));
        *response.status_mut() = stub.status;
        *response.headers_mut() = stub.headers;
        response
    }
}
