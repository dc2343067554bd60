//! Error types for Hawk authentication.
//!
//! All authentication failures are represented by [`AuthError`]. The variants
//! keep the precise cause for diagnostics; [`AuthError::public_message`] and
//! [`AuthError::status`] give the view that is safe to send back to a peer.

use hawkstack_core::{HawkStackError, Timestamp};
use http::StatusCode;

/// Message shown to peers for failures that must not be told apart.
pub const UNAUTHORIZED: &str = "Unauthorized";

/// Errors that can occur while signing or verifying Hawk requests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// A request attribute or protocol field cannot be canonicalized or encoded.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The MAC algorithm is not supported.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The `Authorization`, `Server-Authorization` or `WWW-Authenticate` value could not be parsed.
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// The bewit token could not be decoded.
    #[error("Malformed bewit: {0}")]
    MalformedBewit(String),

    /// The credential identifier is unknown.
    #[error("Credentials not found: {0}")]
    CredentialNotFound(String),

    /// The computed MAC does not match the provided MAC.
    #[error("MAC does not match")]
    MacMismatch,

    /// The request timestamp is outside the skew window.
    #[error("Stale timestamp (server time {now})")]
    StaleTimestamp {
        /// The server's current time, advertised so the client can resync.
        now: Timestamp,
    },

    /// The nonce was already used within the skew window.
    #[error("Replayed nonce")]
    ReplayedNonce,

    /// The payload hash computed from the body differs from the signed hash.
    #[error("Payload hash mismatch")]
    PayloadHashMismatch,

    /// Bewits only authorize GET and HEAD requests.
    #[error("Method not allowed for bewit: {0}")]
    MethodNotAllowed(String),

    /// The bewit's expiry time has passed.
    #[error("Bewit expired")]
    BewitExpired,

    /// The server's response could not be authenticated.
    #[error("Response authentication failed: {0}")]
    ResponseAuthFailed(String),
}

impl AuthError {
    /// HTTP status a transport should answer with for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_)
            | Self::UnsupportedAlgorithm(_)
            | Self::MalformedHeader(_)
            | Self::MalformedBewit(_) => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::CredentialNotFound(_)
            | Self::MacMismatch
            | Self::StaleTimestamp { .. }
            | Self::ReplayedNonce
            | Self::PayloadHashMismatch
            | Self::BewitExpired
            | Self::ResponseAuthFailed(_) => StatusCode::UNAUTHORIZED,
        }
    }

    /// Text that may be disclosed to the peer.
    ///
    /// Unknown credentials and bad MACs share one message so an attacker
    /// cannot enumerate identifiers.
    #[must_use]
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::CredentialNotFound(_) | Self::MacMismatch | Self::ResponseAuthFailed(_) => {
                UNAUTHORIZED
            }
            Self::InvalidInput(_) | Self::UnsupportedAlgorithm(_) => "Bad request",
            Self::MalformedHeader(_) => "Bad header format",
            Self::MalformedBewit(_) => "Invalid bewit structure",
            Self::StaleTimestamp { .. } => "Stale timestamp",
            Self::ReplayedNonce => "Invalid nonce",
            Self::PayloadHashMismatch => "Bad payload hash",
            Self::MethodNotAllowed(_) => "Invalid method",
            Self::BewitExpired => "Access expired",
        }
    }
}

impl From<HawkStackError> for AuthError {
    fn from(err: HawkStackError) -> Self {
        match err {
            HawkStackError::UnsupportedAlgorithm(tag) => Self::UnsupportedAlgorithm(tag),
            other => Self::InvalidInput(other.to_string()),
        }
    }
}

/// Convenience result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;
