//! Composition root wiring the registry, interceptor and client handles

use std::sync::Arc;

use crate::client::StubClient;
use crate::config::Config;
use crate::intercept::Interceptor;
use crate::session::SessionRegistry;
use crate::Result;

/// One harness per test process, or per test for full teardown
///
/// Owns the session registry with an explicit lifetime instead of a
/// process-wide singleton; dropping the harness drops every session it
/// ever created.
pub struct Harness {
    registry: Arc<SessionRegistry>,
    interceptor: Arc<Interceptor>,
}

impl Harness {
    /// Build a harness from a configuration
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        let registry = Arc::new(SessionRegistry::new(config.max_sessions));
        let interceptor = Arc::new(Interceptor::new(
            Arc::clone(&registry),
            config.session_header_name()?,
        ));

        Ok(Self {
            registry,
            interceptor,
        })
    }

    /// Build a harness with the default configuration
    ///
    /// # Panics
    ///
    /// Panics if the default configuration is invalid (programming
    /// error)
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(&Config::default()).expect("default configuration is valid")
    }

    /// Hand out a client handle bound to this harness
    #[must_use]
    pub fn client(&self) -> StubClient {
        StubClient::new(Arc::clone(&self.registry), Arc::clone(&self.interceptor))
    }

    /// The transport extension point, for wiring into a real client seam
    #[must_use]
    pub fn interceptor(&self) -> Arc<Interceptor> {
        Arc::clone(&self.interceptor)
    }

    /// The underlying session registry
    #[must_use]
    pub fn registry(&self) -> Arc<SessionRegistry> {
        Arc::clone(&self.registry)
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StubnetError;

    #[test]
    fn test_harness_rejects_invalid_config() {
        let config = Config {
            max_sessions: 0,
            ..Config::default()
        };

        assert!(matches!(
            Harness::new(&config),
            Err(StubnetError::ConfigError(_))
        ));
    }

    #[test]
    fn test_separate_harnesses_have_separate_registries() {
        let first = Harness::with_defaults();
        let second = Harness::with_defaults();

        first.registry().create_session().unwrap();

        assert_eq!(first.registry().session_count(), 1);
        assert_eq!(second.registry().session_count(), 0);
    }
}
