//! Session token generation

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};

static NEXT_SEED: AtomicU64 = AtomicU64::new(0);

/// Opaque session token, unique across concurrent sessions
///
/// Carries 128 bits of a SHA-256 digest over a process-wide counter and
/// a nanosecond timestamp, hex-encoded so it can travel in a header.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh token
    #[must_use]
    pub fn generate() -> Self {
        let mut hasher = Sha256::new();
        hasher.update(NEXT_SEED.fetch_add(1, Ordering::Relaxed).to_le_bytes());

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards")
            .as_nanos();
        hasher.update(timestamp.to_le_bytes());

        let digest = hasher.finalize();
        Self(hex::encode(&digest[..16]))
    }

    /// View the token as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl From<String> for SessionId {
    fn from(token: String) -> Self {
        Self(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_unique() {
        let id1 = SessionId::generate();
        let id2 = SessionId::generate();

        assert_ne!(id1, id2, "Tokens must be unique across generations");
    }

    #[test]
    fn test_token_is_hex_128_bits() {
        let id = SessionId::generate();

        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_roundtrip_through_string() {
        let id = SessionId::generate();
        let parsed = SessionId::from(id.as_str());

        assert_eq!(id, parsed);
        assert_eq!(id.to_string(), id.as_str());
    }
}
