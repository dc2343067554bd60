//! Request attributes covered by a Hawk MAC.
//!
//! [`RequestAttributes`] borrows the method, host, port and path-and-query
//! of one request, plus the optional payload hash and extension fields. It
//! is built per call, either by hand or from `http` types, and never
//! retained.

use hawkstack_core::Timestamp;
use http::request::Parts;
use http::{Method, Uri};

use crate::canonical::{MacKind, MacParams};
use crate::error::{AuthError, AuthResult};

/// The parts of an HTTP request that a Hawk MAC covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestAttributes<'a> {
    /// HTTP method.
    pub method: &'a str,
    /// Host name as sent by the client.
    pub host: &'a str,
    /// Port; never inferred from an omitted default.
    pub port: u16,
    /// Path and query string.
    pub path: &'a str,
    /// Payload hash to sign (client side).
    pub hash: Option<&'a [u8]>,
    /// Application-specific extension data to sign.
    pub ext: Option<&'a str>,
    /// Application identifier carried alongside the MAC.
    pub app: Option<&'a str>,
    /// Delegated-by application identifier carried alongside the MAC.
    pub dlg: Option<&'a str>,
}

impl<'a> RequestAttributes<'a> {
    /// Create attributes for a request without payload hash or extension data.
    ///
    /// # Examples
    ///
    /// ```
    /// use hawkstack_auth::request::RequestAttributes;
    ///
    /// let request = RequestAttributes::new("GET", "example.com", 443, "/resource?a=1")
    ///     .with_ext("some-app-data");
    /// assert_eq!(request.ext, Some("some-app-data"));
    /// ```
    #[must_use]
    pub fn new(method: &'a str, host: &'a str, port: u16, path: &'a str) -> Self {
        Self {
            method,
            host,
            port,
            path,
            hash: None,
            ext: None,
            app: None,
            dlg: None,
        }
    }

    /// Attach a payload hash (see [`crate::payload::PayloadHasher`]).
    #[must_use]
    pub fn with_hash(mut self, hash: &'a [u8]) -> Self {
        self.hash = Some(hash);
        self
    }

    /// Attach extension data.
    #[must_use]
    pub fn with_ext(mut self, ext: &'a str) -> Self {
        self.ext = Some(ext);
        self
    }

    /// Attach an application identifier.
    #[must_use]
    pub fn with_app(mut self, app: &'a str) -> Self {
        self.app = Some(app);
        self
    }

    /// Attach a delegated-by application identifier.
    #[must_use]
    pub fn with_dlg(mut self, dlg: &'a str) -> Self {
        self.dlg = Some(dlg);
        self
    }

    /// Attributes of a request received by a server.
    ///
    /// The host and port come from the `Host` header, falling back to the
    /// URI authority; `default_port` applies when neither names a port.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidInput`] if no host is available or the
    /// host or port is unreadable.
    pub fn from_parts(parts: &'a Parts, default_port: u16) -> AuthResult<Self> {
        let authority = match parts.headers.get(http::header::HOST) {
            Some(value) => value.to_str().map_err(|_| {
                AuthError::InvalidInput("Host header is not visible ASCII".to_owned())
            })?,
            None => parts
                .uri
                .authority()
                .map(http::uri::Authority::as_str)
                .ok_or_else(|| AuthError::InvalidInput("missing Host header".to_owned()))?,
        };
        let (host, port) = split_host_port(authority)?;

        Ok(Self::new(
            parts.method.as_str(),
            host,
            port.unwrap_or(default_port),
            path_and_query(&parts.uri),
        ))
    }

    /// Attributes of a request about to be sent by a client.
    ///
    /// The port comes from the URI, or from the `http`/`https` scheme default.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidInput`] if the URI has no host, or no port
    /// and a scheme without a known default.
    pub fn from_uri(method: &'a Method, uri: &'a Uri) -> AuthResult<Self> {
        let host = uri
            .host()
            .ok_or_else(|| AuthError::InvalidInput("URI has no host".to_owned()))?;
        let port = match (uri.port_u16(), uri.scheme_str()) {
            (Some(port), _) => port,
            (None, Some("https")) => 443,
            (None, Some("http")) => 80,
            (None, scheme) => {
                return Err(AuthError::InvalidInput(format!(
                    "cannot infer port for scheme {scheme:?}"
                )));
            }
        };

        Ok(Self::new(method.as_str(), host, port, path_and_query(uri)))
    }

    /// Build MAC parameters for this request.
    pub(crate) fn mac_params(
        &self,
        kind: MacKind,
        ts: Timestamp,
        nonce: &'a str,
        hash: Option<&'a [u8]>,
        ext: Option<&'a str>,
    ) -> MacParams<'a> {
        MacParams {
            kind,
            ts,
            nonce,
            method: self.method,
            host: self.host,
            port: self.port,
            path: self.path,
            hash,
            ext,
        }
    }
}

/// The protocol values of one signed request.
///
/// The client keeps these after signing and the server returns them after
/// authenticating; both sides need them to compute the response MAC, which
/// echoes the request's `ts` and `nonce`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestArtifacts {
    /// Request timestamp.
    pub ts: Timestamp,
    /// Request nonce.
    pub nonce: String,
    /// Payload hash covered by the request MAC.
    pub hash: Option<Vec<u8>>,
    /// Extension data covered by the request MAC.
    pub ext: Option<String>,
    /// Application identifier.
    pub app: Option<String>,
    /// Delegated-by application identifier.
    pub dlg: Option<String>,
}

fn path_and_query(uri: &Uri) -> &str {
    uri.path_and_query().map_or("/", http::uri::PathAndQuery::as_str)
}

/// Split `host[:port]`, keeping IPv6 literals in brackets.
fn split_host_port(authority: &str) -> AuthResult<(&str, Option<u16>)> {
    let authority = authority.trim();
    let authority = authority
        .rsplit_once('@')
        .map_or(authority, |(_, host)| host);

    let (host, port) = if authority.starts_with('[') {
        let end = authority
            .find(']')
            .ok_or_else(|| AuthError::InvalidInput("unterminated IPv6 host".to_owned()))?;
        let (host, rest) = authority.split_at(end + 1);
        match rest {
            "" => (host, None),
            _ => (
                host,
                Some(rest.strip_prefix(':').ok_or_else(|| {
                    AuthError::InvalidInput(format!("invalid host {authority:?}"))
                })?),
            ),
        }
    } else {
        match authority.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (authority, None),
        }
    };

    if host.is_empty() {
        return Err(AuthError::InvalidInput("empty host".to_owned()));
    }
    let port = port
        .map(|p| {
            p.parse::<u16>()
                .map_err(|_| AuthError::InvalidInput(format!("invalid port {p:?}")))
        })
        .transpose()?;
    Ok((host, port))
}
