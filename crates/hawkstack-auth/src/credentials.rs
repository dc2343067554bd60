//! Credentials and the credential lookup collaborator.
//!
//! This module defines [`Credentials`] (an identifier plus a [`Key`]), the
//! [`CredentialProvider`] trait for resolving credentials from an identifier,
//! and a [`StaticCredentialProvider`] for tests and development.

use std::collections::HashMap;
use std::fmt;

use hawkstack_core::{Algorithm, HawkConfig};

use crate::error::AuthError;
use crate::mac;

/// A shared secret and the HMAC algorithm it is used with.
///
/// Any byte sequence is accepted; passwords should not be used as keys.
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Key {
    secret: Vec<u8>,
    algorithm: Algorithm,
}

impl Key {
    /// Create a key from raw secret bytes.
    pub fn new(secret: impl Into<Vec<u8>>, algorithm: Algorithm) -> Self {
        Self {
            secret: secret.into(),
            algorithm,
        }
    }

    /// The algorithm this key signs with.
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Compute the MAC of `message`.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        mac::sign(&self.secret, self.algorithm, message)
    }

    /// Check `candidate` against the MAC of `message` in constant time.
    #[must_use]
    pub fn verify(&self, message: &[u8], candidate: &[u8]) -> bool {
        mac::verify(&self.secret, self.algorithm, message, candidate)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("algorithm", &self.algorithm)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Hawk credentials: an identifier and the key associated with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Opaque identifier sent on the wire as `id`.
    pub id: String,
    /// The shared key.
    pub key: Key,
}

impl Credentials {
    /// Create credentials from an identifier, secret and algorithm.
    pub fn new(id: impl Into<String>, secret: impl Into<Vec<u8>>, algorithm: Algorithm) -> Self {
        Self {
            id: id.into(),
            key: Key::new(secret, algorithm),
        }
    }

    /// Create credentials using the configured default algorithm.
    pub fn from_config(
        id: impl Into<String>,
        secret: impl Into<Vec<u8>>,
        config: &HawkConfig,
    ) -> Self {
        Self::new(id, secret, config.default_algorithm)
    }
}

/// Trait for looking up credentials by identifier.
///
/// Implementations may back this with a database, configuration file,
/// or any other credential store.
pub trait CredentialProvider: Send + Sync {
    /// Retrieve the credentials for the given identifier.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::CredentialNotFound`] if the identifier is not recognized.
    fn get_credentials(&self, id: &str) -> Result<Credentials, AuthError>;
}

/// A simple in-memory credential provider backed by a `HashMap`.
///
/// Suitable for testing and development environments.
///
/// # Examples
///
/// ```
/// use hawkstack_auth::credentials::{CredentialProvider, Credentials, StaticCredentialProvider};
/// use hawkstack_core::{Algorithm, HawkConfig};
///
/// let provider = StaticCredentialProvider::new(vec![Credentials::new(
///     "dh37fgj492je",
///     "werxhqb98rpaxn39848xrunpaw3489ruxnpa98w4rxn",
///     Algorithm::Sha256,
/// )]);
///
/// let credentials = provider.get_credentials("dh37fgj492je").unwrap();
/// assert_eq!(credentials.key.algorithm(), Algorithm::Sha256);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialProvider {
    credentials: HashMap<String, Credentials>,
}

impl StaticCredentialProvider {
    /// Create a new `StaticCredentialProvider` from an iterable of credentials.
    pub fn new(credentials: impl IntoIterator<Item = Credentials>) -> Self {
        Self {
            credentials: credentials
                .into_iter()
                .map(|c| (c.id.clone(), c))
                .collect(),
        }
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn get_credentials(&self, id: &str) -> Result<Credentials, AuthError> {
        self.credentials
            .get(id)
            .cloned()
            .ok_or_else(|| AuthError::CredentialNotFound(id.to_owned()))
    }
}
