//! Glue between the Hawk flows and `http` request and response types.
//!
//! Transports hand over the [`Parts`] of an incoming request and get either
//! the authentication result or a [`Rejection`] carrying the status and the
//! `WWW-Authenticate` value to answer with. Clients can sign an
//! [`http::Request`] in place with [`sign_request`].

use http::header::{AUTHORIZATION, HeaderName, HeaderValue, WWW_AUTHENTICATE};
use http::request::Parts;
use http::{Request, Response, StatusCode};

use crate::client::Client;
use crate::error::{AuthError, AuthResult};
use crate::request::{RequestArtifacts, RequestAttributes};
use crate::server::{Authenticated, AuthenticatedBewit, Server};

/// Response header carrying the server's MAC.
pub const SERVER_AUTHORIZATION: HeaderName = HeaderName::from_static("server-authorization");

/// A failed authentication, ready to be sent back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Status to respond with.
    pub status: StatusCode,
    /// `WWW-Authenticate` value to respond with.
    pub www_authenticate: String,
    /// The underlying error, for logging.
    pub error: AuthError,
}

impl Rejection {
    /// Build the rejection for `error`.
    ///
    /// `authorization` is the raw header of the rejected request, used to
    /// sign the server time for stale requests.
    #[must_use]
    pub fn new(server: &Server, error: AuthError, authorization: Option<&str>) -> Self {
        Self {
            status: error.status(),
            www_authenticate: server.challenge(&error, authorization),
            error,
        }
    }

    /// Render as an empty-bodied response.
    #[must_use]
    pub fn into_response<B: Default>(self) -> Response<B> {
        let mut response = Response::new(B::default());
        *response.status_mut() = self.status;
        if let Ok(value) = HeaderValue::from_str(&self.www_authenticate) {
            response.headers_mut().insert(WWW_AUTHENTICATE, value);
        }
        response
    }
}

/// Authenticate an incoming request from its parts.
///
/// A missing `Authorization` header is reported like unknown credentials.
///
/// # Errors
///
/// Returns a [`Rejection`] for every [`Server::authenticate`] failure and for
/// unreadable request attributes.
pub fn authenticate_parts(
    server: &Server,
    parts: &Parts,
    default_port: u16,
    payload_hash: Option<&[u8]>,
) -> Result<Authenticated, Rejection> {
    let authorization = match parts.headers.get(AUTHORIZATION).map(HeaderValue::to_str) {
        Some(Ok(value)) => value,
        Some(Err(_)) => {
            let error = AuthError::MalformedHeader("Authorization is not visible ASCII".to_owned());
            return Err(Rejection::new(server, error, None));
        }
        None => {
            return Err(Rejection::new(
                server,
                AuthError::CredentialNotFound(String::new()),
                None,
            ));
        }
    };

    RequestAttributes::from_parts(parts, default_port)
        .and_then(|request| server.authenticate(&request, authorization, payload_hash))
        .map_err(|error| Rejection::new(server, error, Some(authorization)))
}

/// Authenticate an incoming request carrying a `bewit` query parameter.
///
/// # Errors
///
/// Returns a [`Rejection`] for every [`Server::authenticate_bewit`] failure
/// and for unreadable request attributes.
pub fn authenticate_bewit_parts(
    server: &Server,
    parts: &Parts,
    default_port: u16,
) -> Result<AuthenticatedBewit, Rejection> {
    RequestAttributes::from_parts(parts, default_port)
        .and_then(|request| server.authenticate_bewit(&request))
        .map_err(|error| Rejection::new(server, error, None))
}

/// Sign `request` and set its `Authorization` header.
///
/// The request URI must be absolute. Returns the artifacts needed to
/// authenticate the response.
///
/// # Errors
///
/// Returns [`AuthError::InvalidInput`] if the URI has no host or the header
/// cannot be built.
pub fn sign_request<B>(
    client: &Client,
    request: &mut Request<B>,
    payload_hash: Option<&[u8]>,
) -> AuthResult<RequestArtifacts> {
    let mut attributes = RequestAttributes::from_uri(request.method(), request.uri())?;
    attributes.hash = payload_hash;
    let signed = client.header(&attributes)?;

    let value = HeaderValue::from_str(&signed.authorization())
        .map_err(|e| AuthError::InvalidInput(format!("Authorization header: {e}")))?;
    request.headers_mut().insert(AUTHORIZATION, value);
    Ok(signed.artifacts)
}
