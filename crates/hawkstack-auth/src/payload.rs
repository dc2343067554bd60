//! Payload hashing.
//!
//! The `hash` field of a Hawk header is the digest of
//!
//! ```text
//! hawk.1.payload\n
//! <content-type>\n
//! <payload>\n
//! ```
//!
//! computed with the digest family of the credential's algorithm. Feed the
//! entity body to a [`PayloadHasher`] and pass the result to the request or
//! response being signed or checked.

use hawkstack_core::Algorithm;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};

#[derive(Debug, Clone)]
enum Hasher {
    Sha1(Sha1),
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
}

impl Hasher {
    fn new(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Sha1 => Self::Sha1(Sha1::new()),
            Algorithm::Sha256 => Self::Sha256(Sha256::new()),
            Algorithm::Sha384 => Self::Sha384(Sha384::new()),
            Algorithm::Sha512 => Self::Sha512(Sha512::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha1(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
            Self::Sha384(h) => h.update(data),
            Self::Sha512(h) => h.update(data),
        }
    }

    fn finish(self) -> Vec<u8> {
        match self {
            Self::Sha1(h) => h.finalize().to_vec(),
            Self::Sha256(h) => h.finalize().to_vec(),
            Self::Sha384(h) => h.finalize().to_vec(),
            Self::Sha512(h) => h.finalize().to_vec(),
        }
    }
}

/// Incremental hasher for request and response payloads.
#[derive(Debug, Clone)]
pub struct PayloadHasher {
    hasher: Hasher,
}

impl PayloadHasher {
    /// Start hashing a payload of the given content type.
    ///
    /// Parameters after `;` are dropped and the media type is trimmed and
    /// lowercased, so `Text/Plain; charset=utf-8` hashes as `text/plain`.
    #[must_use]
    pub fn new(content_type: &str, algorithm: Algorithm) -> Self {
        let mut hasher = Hasher::new(algorithm);
        hasher.update(b"hawk.1.payload\n");
        hasher.update(normalize_content_type(content_type).as_bytes());
        hasher.update(b"\n");
        Self { hasher }
    }

    /// Hash a complete payload in one call.
    ///
    /// # Examples
    ///
    /// ```
    /// use hawkstack_auth::payload::PayloadHasher;
    /// use hawkstack_core::Algorithm;
    ///
    /// let hash = PayloadHasher::hash("text/plain", Algorithm::Sha256, b"Thank you for flying Hawk");
    /// assert_eq!(hash.len(), 32);
    /// ```
    #[must_use]
    pub fn hash(content_type: &str, algorithm: Algorithm, payload: impl AsRef<[u8]>) -> Vec<u8> {
        let mut hasher = Self::new(content_type, algorithm);
        hasher.update(payload);
        hasher.finish()
    }

    /// Feed more payload bytes.
    pub fn update(&mut self, data: impl AsRef<[u8]>) {
        self.hasher.update(data.as_ref());
    }

    /// Finish hashing and return the digest.
    ///
    /// A trailing newline is appended to the payload before finalizing.
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        self.hasher.update(b"\n");
        self.hasher.finish()
    }
}

fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
