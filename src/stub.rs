//! Stub declarations, the per-session store and the matching engine

use std::sync::{Mutex, PoisonError};

use bytes::Bytes;
use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use hyper::{Method, StatusCode, Uri};
use tracing::debug;

use crate::record::RequestRecord;

/// Canned response a stub answers with
#[derive(Debug, Clone)]
pub struct StubResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body
    pub body: Bytes,
}

/// Outcome bound to a declared stub
#[derive(Debug, Clone)]
pub enum StubOutcome {
    /// Answer the call with a canned response
    Respond(StubResponse),
    /// Fail the call with a simulated transport fault
    Fail(String),
}

/// One declared expectation: a request predicate bound to an outcome
#[derive(Debug, Clone)]
pub struct StubEndpoint {
    method: Method,
    url: Uri,
    header_matches: Vec<(HeaderName, HeaderValue)>,
    outcome: StubOutcome,
    consumed: bool,
}

impl StubEndpoint {
    /// Declare a stub
    ///
    /// An empty `header_matches` means no header constraint.
    #[must_use]
    pub fn new(
        method: Method,
        url: Uri,
        outcome: StubOutcome,
        header_matches: Vec<(HeaderName, HeaderValue)>,
    ) -> Self {
        Self {
            method,
            url,
            header_matches,
            outcome,
            consumed: false,
        }
    }

    /// Whether this stub's predicate accepts the request
    ///
    /// The method matches case-insensitively per protocol convention
    /// (an extension method built from a lowercase string still matches
    /// its uppercase form), the URL must match exactly, and every
    /// required header must be present with exactly the required value.
    /// Extra request headers never disqualify a match.
    #[must_use]
    pub fn matches(&self, request: &RequestRecord) -> bool {
        if !self
            .method
            .as_str()
            .eq_ignore_ascii_case(request.method.as_str())
            || self.url != request.url
        {
            return false;
        }

        self.header_matches.iter().all(|(name, value)| {
            request
                .headers
                .get_all(name)
                .iter()
                .any(|candidate| candidate == value)
        })
    }

    /// Whether this stub has already answered a call
    #[must_use]
    pub fn is_consumed(&self) -> bool {
        self.consumed
    }
}

/// Result of scanning a session's stubs for one outgoing request
#[derive(Debug, Clone)]
pub enum MatchResult {
    /// First unconsumed matching stub, now consumed
    Matched {
        /// Declaration-order index of the consumed stub
        stub_index: usize,
        /// The outcome the stub was declared with
        outcome: StubOutcome,
    },
    /// No unconsumed stub matched
    NoMatch,
}

/// Ordered per-session collection of declared stubs
#[derive(Default)]
pub struct StubStore {
    entries: Mutex<Vec<StubEndpoint>>,
}

impl StubStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Append a stub, preserving declaration order
    pub fn declare(&self, stub: StubEndpoint) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(stub);
    }

    /// Find the first unconsumed matching stub and mark it consumed
    ///
    /// Scans in declaration order, first eligible wins; no priority or
    /// specificity scoring. Selection and the consumed-flag update
    /// happen under one lock, so concurrent callers can never consume
    /// the same stub twice. A selected stub stays consumed even if the
    /// caller discards the outcome.
    pub fn find_and_consume(&self, request: &RequestRecord) -> MatchResult {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        for (index, stub) in entries.iter_mut().enumerate() {
            if stub.consumed || !stub.matches(request) {
                continue;
            }

            stub.consumed = true;
            debug!(
                "Consumed stub {index} for {} {}",
                request.method, request.url
            );
            return MatchResult::Matched {
                stub_index: index,
                outcome: stub.outcome.clone(),
            };
        }

        MatchResult::NoMatch
    }

    /// Number of declared stubs, consumed or not
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no stub has been declared
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn request(method: Method, url: &'static str, headers: &[(&'static str, &'static str)]) -> RequestRecord {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.append(
                name.parse::<HeaderName>().unwrap(),
                HeaderValue::from_static(value),
            );
        }
        RequestRecord {
            method,
            url: Uri::from_static(url),
            headers: map,
            body: Bytes::new(),
        }
    }

    fn fault_stub(method: Method, url: &'static str, matches: Vec<(HeaderName, HeaderValue)>) -> StubEndpoint {
        StubEndpoint::new(method, Uri::from_static(url), StubOutcome::Fail("boom".to_string()), matches)
    }

    #[test]
    fn test_method_and_url_must_match() {
        let stub = fault_stub(Method::GET, "http://api.test/x", vec![]);

        assert!(stub.matches(&request(Method::GET, "http://api.test/x", &[])));
        assert!(!stub.matches(&request(Method::POST, "http://api.test/x", &[])));
        assert!(!stub.matches(&request(Method::GET, "http://api.test/y", &[])));
    }

    #[test]
    fn test_method_match_is_case_insensitive() {
        let lowercase = "get".parse::<Method>().unwrap();
        let stub = fault_stub(lowercase.clone(), "http://api.test/x", vec![]);

        assert!(stub.matches(&request(Method::GET, "http://api.test/x", &[])));

        let uppercase_stub = fault_stub(Method::GET, "http://api.test/x", vec![]);
        assert!(uppercase_stub.matches(&request(lowercase, "http://api.test/x", &[])));
    }

    #[test]
    fn test_header_constraint_requires_exact_value() {
        let constraint = vec![(
            "x-flag".parse::<HeaderName>().unwrap(),
            HeaderValue::from_static("1"),
        )];
        let stub = fault_stub(Method::GET, "http://api.test/x", constraint);

        assert!(!stub.matches(&request(Method::GET, "http://api.test/x", &[])));
        assert!(!stub.matches(&request(Method::GET, "http://api.test/x", &[("x-flag", "2")])));
        assert!(stub.matches(&request(Method::GET, "http://api.test/x", &[("x-flag", "1")])));
        assert!(stub.matches(&request(
            Method::GET,
            "http://api.test/x",
            &[("x-flag", "1"), ("accept", "application/json")]
        )));
    }

    #[test]
    fn test_find_and_consume_is_at_most_once() {
        let store = StubStore::new();
        store.declare(fault_stub(Method::GET, "http://api.test/x", vec![]));

        let req = request(Method::GET, "http://api.test/x", &[]);
        assert!(matches!(
            store.find_and_consume(&req),
            MatchResult::Matched { stub_index: 0, .. }
        ));
        assert!(matches!(store.find_and_consume(&req), MatchResult::NoMatch));
    }

    #[test]
    fn test_identical_stubs_consumed_in_declaration_order() {
        let store = StubStore::new();
        for message in ["first", "second", "third"] {
            store.declare(StubEndpoint::new(
                Method::GET,
                Uri::from_static("http://api.test/x"),
                StubOutcome::Fail(message.to_string()),
                vec![],
            ));
        }

        let req = request(Method::GET, "http://api.test/x", &[]);
        for expected in ["first", "second", "third"] {
            match store.find_and_consume(&req) {
                MatchResult::Matched {
                    outcome: StubOutcome::Fail(message),
                    ..
                } => assert_eq!(message, expected),
                other => panic!("expected fault outcome, got {other:?}"),
            }
        }
        assert!(matches!(store.find_and_consume(&req), MatchResult::NoMatch));
    }

    #[test]
    fn test_unmatched_scan_consumes_nothing() {
        let store = StubStore::new();
        store.declare(fault_stub(Method::GET, "http://api.test/x", vec![]));

        let miss = request(Method::GET, "http://api.test/other", &[]);
        assert!(matches!(store.find_and_consume(&miss), MatchResult::NoMatch));

        let hit = request(Method::GET, "http://api.test/x", &[]);
        assert!(matches!(
            store.find_and_consume(&hit),
            MatchResult::Matched { .. }
        ));
    }

    #[test]
    fn test_concurrent_consumption_grants_each_stub_once() {
        let store = StubStore::new();
        for _ in 0..8 {
            store.declare(fault_stub(Method::GET, "http://api.test/x", vec![]));
        }

        let granted: usize = std::thread::scope(|scope| {
            (0..16)
                .map(|_| {
                    scope.spawn(|| {
                        let req = request(Method::GET, "http://api.test/x", &[]);
                        usize::from(matches!(
                            store.find_and_consume(&req),
                            MatchResult::Matched { .. }
                        ))
                    })
                })
                .collect::<Vec<_>>()
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .sum()
        });

        assert_eq!(granted, 8, "each stub must be granted exactly once");
    }

    proptest! {
        #[test]
        fn prop_no_constraint_stub_matches_any_header_set(
            headers in proptest::collection::vec(("[a-z]{1,12}", "[a-zA-Z0-9]{0,12}"), 0..8)
        ) {
            let mut map = HeaderMap::new();
            for (name, value) in &headers {
                map.append(
                    name.parse::<HeaderName>().unwrap(),
                    value.parse::<HeaderValue>().unwrap(),
                );
            }
            let req = RequestRecord {
                method: Method::GET,
                url: Uri::from_static("http://api.test/x"),
                headers: map,
                body: Bytes::new(),
            };
            let stub = fault_stub(Method::GET, "http://api.test/x", vec![]);

            prop_assert!(stub.matches(&req));
            prop_assert!(!stub.is_consumed());
        }
    }
}
