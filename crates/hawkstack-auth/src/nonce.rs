//! Nonce generation for outgoing requests.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hawkstack_core::HawkConfig;
use rand::RngExt;

/// Source of request nonces.
pub trait NonceSource: Send + Sync + fmt::Debug {
    /// Produce a fresh nonce. The result must not contain control characters.
    fn nonce(&self) -> String;
}

/// Random nonces, URL-safe base64 encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomNonceSource {
    bytes: usize,
}

impl RandomNonceSource {
    /// Create a source drawing `bytes` random bytes per nonce (at least one).
    #[must_use]
    pub fn new(bytes: usize) -> Self {
        Self {
            bytes: bytes.max(1),
        }
    }

    /// Create a source with the configured nonce length.
    #[must_use]
    pub fn from_config(config: &HawkConfig) -> Self {
        Self::new(config.nonce_bytes)
    }
}

impl Default for RandomNonceSource {
    fn default() -> Self {
        Self::from_config(&HawkConfig::default())
    }
}

impl NonceSource for RandomNonceSource {
    fn nonce(&self) -> String {
        let mut rng = rand::rng();
        let mut buf = vec![0u8; self.bytes];
        rng.fill(buf.as_mut_slice());
        URL_SAFE_NO_PAD.encode(buf)
    }
}
