//! Realm credential verification.
//!
//! A realm proves itself by hashing the connection's salt under a
//! secret shared with the login service. The login side computes the
//! same hash and compares in constant time — the secret itself never
//! crosses the wire, and a captured credential is useless on any other
//! connection because the salt is fresh each time.
//!
//! The [`RealmAuthenticator`] trait keeps the "expected value" side
//! pluggable: the shipped implementation derives it from a single
//! shared secret, a deployment with per-realm secrets can look the
//! secret up by other means, and tests can return canned bytes.

use rand::Rng;
use ring::{constant_time, hmac};

/// Produces the credential value expected from a realm, given the
/// salt its connection was challenged with.
///
/// `Send + Sync + 'static` — the authenticator is shared across every
/// connection task for the lifetime of the server.
pub trait RealmAuthenticator: Send + Sync + 'static {
    /// Computes the expected keyed-hash credentials for `salt`.
    ///
    /// Async so implementations may consult external key storage; the
    /// shipped [`SharedSecretAuthenticator`] resolves immediately.
    fn expected_credentials(
        &self,
        salt: &str,
    ) -> impl std::future::Future<Output = Vec<u8>> + Send;
}

/// The standard authenticator: `HMAC-SHA256(secret, salt)`.
pub struct SharedSecretAuthenticator {
    key: hmac::Key,
}

impl SharedSecretAuthenticator {
    /// Creates an authenticator from the shared realm secret.
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret.as_ref()),
        }
    }
}

impl RealmAuthenticator for SharedSecretAuthenticator {
    async fn expected_credentials(&self, salt: &str) -> Vec<u8> {
        hmac::sign(&self.key, salt.as_bytes()).as_ref().to_vec()
    }
}

/// Compares claimed credentials against the expected value in
/// constant time.
pub fn verify_credentials(expected: &[u8], provided: &[u8]) -> bool {
    constant_time::verify_slices_are_equal(expected, provided).is_ok()
}

/// Generates a fresh connection salt: 16 random bytes, hex-encoded.
///
/// One per accepted connection, sent in the challenge before anything
/// else.
pub fn generate_salt() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    hex::encode(bytes)
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_expected_credentials_deterministic_per_salt() {
        let auth = SharedSecretAuthenticator::new("hunter2");

        let a = auth.expected_credentials("salt-1").await;
        let b = auth.expected_credentials("salt-1").await;
        let c = auth.expected_credentials("salt-2").await;

        assert_eq!(a, b, "same salt must hash identically");
        assert_ne!(a, c, "different salts must hash differently");
        assert_eq!(a.len(), 32, "HMAC-SHA256 tag is 32 bytes");
    }

    #[tokio::test]
    async fn test_different_secrets_produce_different_credentials() {
        let a = SharedSecretAuthenticator::new("hunter2")
            .expected_credentials("salt")
            .await;
        let b = SharedSecretAuthenticator::new("hunter3")
            .expected_credentials("salt")
            .await;
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_credentials_accepts_exact_match_only() {
        let expected = vec![1, 2, 3, 4];

        assert!(verify_credentials(&expected, &[1, 2, 3, 4]));
        assert!(!verify_credentials(&expected, &[1, 2, 3, 5]));
        assert!(!verify_credentials(&expected, &[1, 2, 3]));
        assert!(!verify_credentials(&expected, &[]));
    }

    #[test]
    fn test_generate_salt_is_32_hex_chars_and_varies() {
        let a = generate_salt();
        let b = generate_salt();

        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b, "salts must be fresh per connection");
    }
}
