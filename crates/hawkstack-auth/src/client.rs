//! Client flow: signing requests, checking responses, issuing bewits.
//!
//! A [`Client`] holds one set of credentials together with the clock and
//! nonce collaborators. Signing produces a [`SignedRequest`]; keep its
//! [`RequestArtifacts`] around to authenticate the server's reply with
//! [`Client::authenticate_response`].
//!
//! When the server rejects a request with a stale timestamp, its
//! `WWW-Authenticate` challenge carries the server time and a MAC over it.
//! [`Client::resync`] verifies that MAC and shifts the client's clock offset
//! so the next request lands inside the server's window.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use hawkstack_core::{Clock, HawkConfig, SystemClock, Timestamp};
use tracing::debug;

use crate::bewit::{Bewit, allows_method};
use crate::canonical::{MacKind, calculate_mac, timestamp_message, verify_mac};
use crate::credentials::Credentials;
use crate::error::{AuthError, AuthResult};
use crate::header::Header;
use crate::mac::constant_time_eq;
use crate::nonce::{NonceSource, RandomNonceSource};
use crate::request::{RequestArtifacts, RequestAttributes};

/// Method covered by every bewit MAC; HEAD requests reuse GET bewits.
pub(crate) const BEWIT_METHOD: &str = "GET";

/// A signed request: the `Authorization` header and what went into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    /// The header to send.
    pub header: Header,
    /// Values needed to authenticate the response.
    pub artifacts: RequestArtifacts,
}

impl SignedRequest {
    /// The `Authorization` header value, `Hawk id="...", ...`.
    #[must_use]
    pub fn authorization(&self) -> String {
        self.header.to_header_value()
    }
}

/// Hawk client for one set of credentials.
///
/// # Examples
///
/// ```
/// use hawkstack_auth::client::Client;
/// use hawkstack_auth::credentials::Credentials;
/// use hawkstack_auth::request::RequestAttributes;
/// use hawkstack_core::Algorithm;
///
/// let client = Client::new(Credentials::new("dh37fgj492je", "werxhqb98rpaxn39848xrunpaw3489ruxnpa98w4rxn", Algorithm::Sha256));
/// let request = RequestAttributes::new("GET", "example.com", 8000, "/resource/1?b=1&a=2");
/// let signed = client.header_with(&request, 1353832234, "j4h3g2").unwrap();
/// assert!(signed.authorization().starts_with("Hawk id=\"dh37fgj492je\", ts=\"1353832234\", nonce=\"j4h3g2\", mac=\""));
/// ```
#[derive(Debug)]
pub struct Client {
    credentials: Credentials,
    clock: Arc<dyn Clock>,
    nonces: Arc<dyn NonceSource>,
    offset: AtomicI64,
}

impl Client {
    /// Create a client using the system clock and random nonces.
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self::from_config(credentials, &HawkConfig::default())
    }

    /// Create a client with the configured clock offset and nonce length.
    #[must_use]
    pub fn from_config(credentials: Credentials, config: &HawkConfig) -> Self {
        Self {
            credentials,
            clock: Arc::new(SystemClock),
            nonces: Arc::new(RandomNonceSource::from_config(config)),
            offset: AtomicI64::new(config.localtime_offset_secs),
        }
    }

    /// Replace the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the nonce source.
    #[must_use]
    pub fn with_nonce_source(mut self, nonces: Arc<dyn NonceSource>) -> Self {
        self.nonces = nonces;
        self
    }

    /// The credentials this client signs with.
    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Seconds added to the local clock when stamping requests.
    #[must_use]
    pub fn offset(&self) -> i64 {
        self.offset.load(Ordering::Relaxed)
    }

    /// Local time adjusted by the clock offset.
    #[must_use]
    pub fn now(&self) -> Timestamp {
        self.clock.now().saturating_add(self.offset())
    }

    /// Sign `request` with the current time and a fresh nonce.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidInput`] if a request attribute cannot be
    /// canonicalized or carried in a header.
    pub fn header(&self, request: &RequestAttributes<'_>) -> AuthResult<SignedRequest> {
        let nonce = self.nonces.nonce();
        self.header_with(request, self.now(), &nonce)
    }

    /// Sign `request` with an explicit timestamp and nonce.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidInput`] if a request attribute cannot be
    /// canonicalized or carried in a header.
    pub fn header_with(
        &self,
        request: &RequestAttributes<'_>,
        ts: Timestamp,
        nonce: &str,
    ) -> AuthResult<SignedRequest> {
        let params = request.mac_params(MacKind::Header, ts, nonce, request.hash, request.ext);
        let mac = calculate_mac(&self.credentials.key, &params)?;

        let header = Header::default()
            .with_id(self.credentials.id.as_str())?
            .with_ts(ts)
            .with_nonce(nonce)?
            .with_mac(mac)
            .with_hash(request.hash)
            .with_ext(request.ext)?
            .with_app(request.app)?
            .with_dlg(request.dlg)?;

        debug!(
            id = %self.credentials.id,
            ts,
            method = request.method,
            path = request.path,
            "Signed Hawk request"
        );

        Ok(SignedRequest {
            header,
            artifacts: RequestArtifacts {
                ts,
                nonce: nonce.to_owned(),
                hash: request.hash.map(<[u8]>::to_vec),
                ext: request.ext.map(str::to_owned),
                app: request.app.map(str::to_owned),
                dlg: request.dlg.map(str::to_owned),
            },
        })
    }

    /// Authenticate a `Server-Authorization` value received for `request`.
    ///
    /// `payload_hash` is the hash of the response body as received; when
    /// given, the server must have signed the same hash. Returns the parsed
    /// header so callers can read `ext`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MalformedHeader`] if the value cannot be parsed,
    /// and [`AuthError::ResponseAuthFailed`] if the MAC is missing or wrong
    /// or the payload hash does not match.
    pub fn authenticate_response(
        &self,
        request: &RequestAttributes<'_>,
        artifacts: &RequestArtifacts,
        server_authorization: &str,
        payload_hash: Option<&[u8]>,
    ) -> AuthResult<Header> {
        let header = Header::parse(server_authorization)?;
        let mac = header
            .mac
            .as_deref()
            .ok_or_else(|| AuthError::ResponseAuthFailed("missing mac".to_owned()))?;

        let params = request.mac_params(
            MacKind::Response,
            artifacts.ts,
            &artifacts.nonce,
            header.hash.as_deref(),
            header.ext.as_deref(),
        );
        if !verify_mac(&self.credentials.key, &params, mac)? {
            debug!(
                id = %self.credentials.id,
                ts = artifacts.ts,
                "Server-Authorization MAC mismatch"
            );
            return Err(AuthError::ResponseAuthFailed("bad mac".to_owned()));
        }

        if let Some(expected) = payload_hash {
            let signed = header.hash.as_deref().unwrap_or_default();
            if !constant_time_eq(expected, signed) {
                debug!(id = %self.credentials.id, "Response payload hash mismatch");
                return Err(AuthError::ResponseAuthFailed(
                    "bad payload hash".to_owned(),
                ));
            }
        }

        Ok(header)
    }

    /// Create a bewit granting GET access to `request` for `ttl`.
    ///
    /// The token covers the method `GET`, the host, port and path of
    /// `request`, and its `ext`. Append it with [`crate::bewit::append_bewit`].
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidInput`] if `request` is not a GET or HEAD,
    /// carries a payload hash, the TTL is out of range, or a field cannot be
    /// encoded.
    pub fn bewit(&self, request: &RequestAttributes<'_>, ttl: Duration) -> AuthResult<String> {
        if !allows_method(request.method) {
            return Err(AuthError::InvalidInput(format!(
                "bewits cannot authorize {} requests",
                request.method
            )));
        }
        if request.hash.is_some() {
            return Err(AuthError::InvalidInput(
                "bewits cannot cover a payload hash".to_owned(),
            ));
        }
        let ttl = i64::try_from(ttl.as_secs())
            .map_err(|_| AuthError::InvalidInput("bewit ttl out of range".to_owned()))?;
        let exp = self.now().saturating_add(ttl);

        let params = RequestAttributes {
            method: BEWIT_METHOD,
            ..*request
        }
        .mac_params(MacKind::Bewit, exp, "", None, request.ext);
        let mac = calculate_mac(&self.credentials.key, &params)?;

        debug!(id = %self.credentials.id, exp, path = request.path, "Issued bewit");

        Bewit {
            id: self.credentials.id.clone(),
            exp,
            mac,
            ext: request.ext.map(str::to_owned),
        }
        .to_token()
    }

    /// Resynchronize with the server time advertised in a `WWW-Authenticate` challenge.
    ///
    /// Returns the new clock offset.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MalformedHeader`] if the value cannot be parsed,
    /// and [`AuthError::ResponseAuthFailed`] if `ts` or `tsm` is missing or
    /// `tsm` does not verify under this client's key.
    pub fn resync(&self, www_authenticate: &str) -> AuthResult<i64> {
        let header = Header::parse(www_authenticate)?;
        let (Some(ts), Some(tsm)) = (header.ts, header.tsm.as_deref()) else {
            return Err(AuthError::ResponseAuthFailed(
                "challenge carries no signed timestamp".to_owned(),
            ));
        };

        if !self
            .credentials
            .key
            .verify(timestamp_message(ts).as_bytes(), tsm)
        {
            debug!(id = %self.credentials.id, ts, "Challenge timestamp MAC mismatch");
            return Err(AuthError::ResponseAuthFailed("bad tsm".to_owned()));
        }

        let offset = ts.saturating_sub(self.clock.now());
        self.offset.store(offset, Ordering::Relaxed);
        debug!(id = %self.credentials.id, offset, "Resynchronized clock offset");
        Ok(offset)
    }
}
