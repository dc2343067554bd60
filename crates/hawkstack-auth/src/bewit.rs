//! Bewit tokens.
//!
//! A bewit grants time-limited access to a single URL without an
//! `Authorization` header. The token is the four fields
//!
//! ```text
//! <id>\<exp>\<base64 mac>\<ext>
//! ```
//!
//! joined with backslashes and encoded as URL-safe base64 without padding.
//! `exp` is an absolute expiry in seconds, not an issue time. The MAC is a
//! `hawk.1.bewit` normalized string over the URL with the `bewit` query
//! parameter removed.

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use hawkstack_core::Timestamp;

use crate::error::{AuthError, AuthResult};

/// Query parameter carrying the token.
pub const BEWIT_PARAM: &str = "bewit";

const FIELD_SEPARATOR: char = '\\';

/// URL-safe alphabet, unpadded on encode, padding tolerated on decode.
const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// The decoded contents of a bewit token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bewit {
    /// Credential identifier.
    pub id: String,
    /// Expiry time in seconds.
    pub exp: Timestamp,
    /// `hawk.1.bewit` MAC.
    pub mac: Vec<u8>,
    /// Application-specific extension data.
    pub ext: Option<String>,
}

impl Bewit {
    /// Encode the bewit as a URL-safe token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidInput`] if `id` or `ext` contains a
    /// backslash or a control character, or if `id` is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use hawkstack_auth::bewit::Bewit;
    ///
    /// let bewit = Bewit { id: "me".into(), exp: 1353832834, mac: vec![1, 2, 3], ext: None };
    /// let token = bewit.to_token().unwrap();
    /// assert_eq!(Bewit::from_token(&token).unwrap(), bewit);
    /// ```
    pub fn to_token(&self) -> AuthResult<String> {
        if self.id.is_empty() {
            return Err(AuthError::InvalidInput("bewit id must not be empty".to_owned()));
        }
        check_field("id", &self.id)?;
        let ext = self.ext.as_deref().unwrap_or_default();
        check_field("ext", ext)?;

        let raw = format!(
            "{id}{sep}{exp}{sep}{mac}{sep}{ext}",
            id = self.id,
            sep = FIELD_SEPARATOR,
            exp = self.exp,
            mac = BASE64.encode(&self.mac),
        );
        Ok(TOKEN_ENGINE.encode(raw))
    }

    /// Decode a token taken from the `bewit` query parameter.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MalformedBewit`] if the token is not valid
    /// base64 or UTF-8, does not hold exactly four fields, has an empty id,
    /// a non-numeric expiry, or a MAC that is not valid base64.
    pub fn from_token(token: &str) -> AuthResult<Self> {
        if token.is_empty() {
            return Err(malformed("empty bewit"));
        }
        let decoded = TOKEN_ENGINE
            .decode(token)
            .map_err(|_| malformed("invalid base64 encoding"))?;
        let decoded = String::from_utf8(decoded).map_err(|_| malformed("invalid utf-8"))?;

        let fields: Vec<&str> = decoded.split(FIELD_SEPARATOR).collect();
        let [id, exp, mac, ext] = fields.as_slice() else {
            return Err(malformed(format!(
                "expected 4 fields, found {}",
                fields.len()
            )));
        };

        if id.is_empty() {
            return Err(malformed("missing id"));
        }
        let exp = exp
            .parse::<Timestamp>()
            .map_err(|_| malformed("expiry must be an integer"))?;
        let mac = BASE64
            .decode(mac)
            .map_err(|_| malformed("mac is not valid base64"))?;

        Ok(Self {
            id: (*id).to_owned(),
            exp,
            mac,
            ext: (!ext.is_empty()).then(|| (*ext).to_owned()),
        })
    }
}

/// Remove the `bewit` parameter from a path-and-query string.
///
/// Returns the remaining URL, which is what the bewit MAC covers, together
/// with the raw token. Other parameters keep their order; a query left
/// empty loses its `?`.
///
/// # Errors
///
/// Returns [`AuthError::MalformedBewit`] if there is no `bewit` parameter,
/// if it is empty, or if it appears more than once.
///
/// # Examples
///
/// ```
/// use hawkstack_auth::bewit::strip_bewit;
///
/// let (path, token) = strip_bewit("/resource?a=1&bewit=abc&b=2").unwrap();
/// assert_eq!(path, "/resource?a=1&b=2");
/// assert_eq!(token, "abc");
/// ```
pub fn strip_bewit(path_and_query: &str) -> AuthResult<(String, String)> {
    let (path, query) = path_and_query
        .split_once('?')
        .ok_or_else(|| malformed("missing bewit"))?;

    let mut token = None;
    let mut kept = Vec::new();
    for param in query.split('&') {
        match param.split_once('=') {
            Some((BEWIT_PARAM, value)) => {
                if token.replace(value).is_some() {
                    return Err(malformed("duplicate bewit parameter"));
                }
            }
            _ => kept.push(param),
        }
    }

    let token = token.ok_or_else(|| malformed("missing bewit"))?;
    if token.is_empty() {
        return Err(malformed("empty bewit"));
    }

    let stripped = if kept.is_empty() {
        path.to_owned()
    } else {
        format!("{path}?{}", kept.join("&"))
    };
    Ok((stripped, token.to_owned()))
}

/// Append a `bewit` parameter to a path-and-query string.
#[must_use]
pub fn append_bewit(path_and_query: &str, token: &str) -> String {
    let separator = if path_and_query.contains('?') { '&' } else { '?' };
    format!("{path_and_query}{separator}{BEWIT_PARAM}={token}")
}

/// Whether a bewit may authorize a request with `method`.
#[must_use]
pub fn allows_method(method: &str) -> bool {
    method.eq_ignore_ascii_case("GET") || method.eq_ignore_ascii_case("HEAD")
}

fn check_field(name: &str, value: &str) -> AuthResult<()> {
    if value.contains(FIELD_SEPARATOR) || value.chars().any(char::is_control) {
        return Err(AuthError::InvalidInput(format!(
            "bewit {name} must not contain backslashes or control characters"
        )));
    }
    Ok(())
}

fn malformed(reason: impl Into<String>) -> AuthError {
    AuthError::MalformedBewit(reason.into())
}
