//! Server flow: authenticating requests and bewits, signing responses.
//!
//! [`Server::authenticate`] runs the full request check:
//!
//! 1. Parse the `Authorization` value and require `id`, `ts`, `nonce`, `mac`.
//! 2. Look up the credentials for `id`.
//! 3. Rebuild the normalized string from the request as received and verify
//!    the MAC in constant time.
//! 4. Check the timestamp against the skew window and record the nonce.
//! 5. If the caller hashed the body, compare it with the signed hash.
//!
//! [`Server::authenticate_bewit`] checks a bewit token instead; it is bounded
//! by expiry alone and never touches the nonce store.
//!
//! Unknown identifiers and bad MACs are distinct [`AuthError`] variants for
//! diagnostics, but both render as the same public challenge.

use std::fmt;
use std::sync::Arc;

use hawkstack_core::{Clock, HawkConfig, SystemClock, Timestamp};
use tracing::debug;

use crate::bewit::{Bewit, allows_method, strip_bewit};
use crate::canonical::{MacKind, calculate_mac, timestamp_message, verify_mac};
use crate::client::BEWIT_METHOD;
use crate::credentials::{CredentialProvider, Credentials};
use crate::error::{AuthError, AuthResult};
use crate::header::{Header, SCHEME};
use crate::mac::constant_time_eq;
use crate::replay::FreshnessGuard;
use crate::request::{RequestArtifacts, RequestAttributes};

/// A successfully authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    /// The credentials the request was signed with.
    pub credentials: Credentials,
    /// Protocol values of the request, needed for the response header.
    pub artifacts: RequestArtifacts,
}

/// A successfully authenticated bewit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedBewit {
    /// The credentials the bewit was issued with.
    pub credentials: Credentials,
    /// Expiry of the bewit.
    pub exp: Timestamp,
    /// Extension data carried in the bewit.
    pub ext: Option<String>,
}

/// Optional values covered by a `Server-Authorization` MAC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResponseOptions<'a> {
    /// Hash of the response payload.
    pub hash: Option<&'a [u8]>,
    /// Extension data.
    pub ext: Option<&'a str>,
}

/// Hawk server: verifies incoming requests against a credential provider.
pub struct Server {
    credentials: Arc<dyn CredentialProvider>,
    guard: FreshnessGuard,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("guard", &self.guard)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl Server {
    /// Create a server over `credentials` and `guard`, using the system clock.
    #[must_use]
    pub fn new(credentials: Arc<dyn CredentialProvider>, guard: FreshnessGuard) -> Self {
        Self {
            credentials,
            guard,
            clock: Arc::new(SystemClock),
        }
    }

    /// Create a server with an in-memory nonce store and the configured skew window.
    #[must_use]
    pub fn from_config(credentials: Arc<dyn CredentialProvider>, config: &HawkConfig) -> Self {
        Self::new(credentials, FreshnessGuard::from_config(config))
    }

    /// Replace the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The freshness guard, e.g. for spawning a [`crate::replay::NonceSweeper`].
    #[must_use]
    pub fn guard(&self) -> &FreshnessGuard {
        &self.guard
    }

    /// The server clock.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Authenticate a request carrying an `Authorization` header.
    ///
    /// `request` must describe the request as received. `payload_hash` is
    /// the hash of the received body (see [`crate::payload::PayloadHasher`]);
    /// pass `None` to skip payload validation.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MalformedHeader`], [`AuthError::CredentialNotFound`],
    /// [`AuthError::MacMismatch`], [`AuthError::StaleTimestamp`],
    /// [`AuthError::ReplayedNonce`] or [`AuthError::PayloadHashMismatch`].
    pub fn authenticate(
        &self,
        request: &RequestAttributes<'_>,
        authorization: &str,
        payload_hash: Option<&[u8]>,
    ) -> AuthResult<Authenticated> {
        let header = Header::parse(authorization)?;
        let fields = header.require_request_fields()?;

        let credentials = self.credentials.get_credentials(fields.id).inspect_err(|_| {
            debug!(id = fields.id, "Unknown Hawk credentials");
        })?;

        let params = request.mac_params(
            MacKind::Header,
            fields.ts,
            fields.nonce,
            header.hash.as_deref(),
            header.ext.as_deref(),
        );
        if !verify_mac(&credentials.key, &params, fields.mac)? {
            debug!(
                id = fields.id,
                ts = fields.ts,
                method = request.method,
                path = request.path,
                "Hawk request MAC mismatch"
            );
            return Err(AuthError::MacMismatch);
        }

        self.guard
            .check(fields.id, fields.nonce, fields.ts, self.clock.now())?;

        if let Some(expected) = payload_hash {
            let signed = header.hash.as_deref().unwrap_or_default();
            if !constant_time_eq(expected, signed) {
                debug!(id = fields.id, signed = header.hash.is_some(), "Payload hash mismatch");
                return Err(AuthError::PayloadHashMismatch);
            }
        }

        debug!(id = fields.id, ts = fields.ts, "Hawk request authenticated");

        let artifacts = RequestArtifacts {
            ts: fields.ts,
            nonce: fields.nonce.to_owned(),
            hash: header.hash.clone(),
            ext: header.ext.clone(),
            app: header.app.clone(),
            dlg: header.dlg.clone(),
        };
        Ok(Authenticated {
            credentials,
            artifacts,
        })
    }

    /// Authenticate a request carrying a `bewit` query parameter.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MethodNotAllowed`] for methods other than GET and
    /// HEAD, then [`AuthError::MalformedBewit`], [`AuthError::BewitExpired`],
    /// [`AuthError::CredentialNotFound`] or [`AuthError::MacMismatch`].
    pub fn authenticate_bewit(
        &self,
        request: &RequestAttributes<'_>,
    ) -> AuthResult<AuthenticatedBewit> {
        if !allows_method(request.method) {
            return Err(AuthError::MethodNotAllowed(request.method.to_owned()));
        }

        let (path, token) = strip_bewit(request.path)?;
        let bewit = Bewit::from_token(&token)?;

        let now = self.clock.now();
        if now > bewit.exp {
            debug!(id = %bewit.id, exp = bewit.exp, now, "Bewit expired");
            return Err(AuthError::BewitExpired);
        }

        let credentials = self.credentials.get_credentials(&bewit.id).inspect_err(|_| {
            debug!(id = %bewit.id, "Unknown bewit credentials");
        })?;

        let stripped = RequestAttributes {
            method: BEWIT_METHOD,
            path: &path,
            ..*request
        };
        let params = stripped.mac_params(MacKind::Bewit, bewit.exp, "", None, bewit.ext.as_deref());
        if !verify_mac(&credentials.key, &params, &bewit.mac)? {
            debug!(id = %bewit.id, path = %path, "Bewit MAC mismatch");
            return Err(AuthError::MacMismatch);
        }

        debug!(id = %bewit.id, exp = bewit.exp, "Bewit authenticated");
        Ok(AuthenticatedBewit {
            credentials,
            exp: bewit.exp,
            ext: bewit.ext,
        })
    }

    /// Build the `Server-Authorization` value answering an authenticated request.
    ///
    /// The MAC echoes the request's `ts` and `nonce`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidInput`] if `options.ext` cannot be carried.
    pub fn response_header(
        &self,
        authenticated: &Authenticated,
        request: &RequestAttributes<'_>,
        options: &ResponseOptions<'_>,
    ) -> AuthResult<String> {
        let artifacts = &authenticated.artifacts;
        let params = request.mac_params(
            MacKind::Response,
            artifacts.ts,
            &artifacts.nonce,
            options.hash,
            options.ext,
        );
        let mac = calculate_mac(&authenticated.credentials.key, &params)?;

        let header = Header::default()
            .with_mac(mac)
            .with_hash(options.hash)
            .with_ext(options.ext)?;
        Ok(header.to_header_value())
    }

    /// Build the `WWW-Authenticate` value for a rejected request.
    ///
    /// A stale timestamp advertises the server time; when the rejected
    /// credentials are known it also carries `tsm`, the MAC of that time,
    /// so the client can trust it for [`crate::client::Client::resync`].
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidInput`] if the message cannot be carried.
    pub fn www_authenticate(
        &self,
        error: &AuthError,
        credentials: Option<&Credentials>,
    ) -> AuthResult<String> {
        let mut header = Header::default();
        if let AuthError::StaleTimestamp { now } = error {
            header = header.with_ts(*now);
            if let Some(credentials) = credentials {
                header = header.with_tsm(credentials.key.sign(timestamp_message(*now).as_bytes()));
            }
        }
        Ok(header.with_error(error.public_message())?.to_header_value())
    }

    /// Build the `WWW-Authenticate` value for `error`, resolving the
    /// credentials of a stale request from its `Authorization` value.
    #[must_use]
    pub fn challenge(&self, error: &AuthError, authorization: Option<&str>) -> String {
        let credentials = match error {
            AuthError::StaleTimestamp { .. } => authorization
                .and_then(|value| Header::parse(value).ok())
                .and_then(|header| header.id)
                .and_then(|id| self.credentials.get_credentials(&id).ok()),
            _ => None,
        };
        self.www_authenticate(error, credentials.as_ref())
            .unwrap_or_else(|_| SCHEME.to_owned())
    }
}
