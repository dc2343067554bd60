//! Hawk header value codec.
//!
//! Parses and serializes the `key="value"` attribute lists carried in the
//! `Authorization`, `Server-Authorization` and `WWW-Authenticate` headers:
//!
//! ```text
//! Hawk id="dh37fgj492je", ts="1353832234", nonce="j4h3g2", mac="6R4rV5iE+NPoym+WwjeHzjAGXUtLNIxmo1vpMofpLAE="
//! ```
//!
//! Quoted values use a single escaping table, [`ESCAPED_CHARS`]: each listed
//! character is written as a backslash followed by itself. Parsing and
//! serialization both consult that table, so every value without control
//! characters round-trips exactly.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hawkstack_core::Timestamp;
use tracing::debug;

use crate::error::{AuthError, AuthResult};

/// Authentication scheme name.
pub const SCHEME: &str = "Hawk";

/// Characters that are backslash-escaped inside quoted values.
pub const ESCAPED_CHARS: [char; 2] = ['\\', '"'];

/// A parsed or to-be-serialized Hawk attribute list.
///
/// All fields are optional at the type level; which ones must be present
/// depends on the header being handled (see [`Header::require_request_fields`]).
/// `mac`, `hash` and `tsm` hold raw bytes and are base64-encoded on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    /// Credential identifier.
    pub id: Option<String>,
    /// Timestamp in seconds.
    pub ts: Option<Timestamp>,
    /// Request nonce.
    pub nonce: Option<String>,
    /// Request or response MAC.
    pub mac: Option<Vec<u8>>,
    /// Payload hash.
    pub hash: Option<Vec<u8>>,
    /// Application-specific extension data.
    pub ext: Option<String>,
    /// Application identifier.
    pub app: Option<String>,
    /// Delegated-by application identifier.
    pub dlg: Option<String>,
    /// MAC over `ts` in a clock-resync challenge.
    pub tsm: Option<Vec<u8>>,
    /// Error message in a `WWW-Authenticate` challenge.
    pub error: Option<String>,
}

/// The fields every request `Authorization` header must carry.
#[derive(Debug, Clone, Copy)]
pub struct RequestFields<'a> {
    /// Credential identifier.
    pub id: &'a str,
    /// Timestamp in seconds.
    pub ts: Timestamp,
    /// Request nonce.
    pub nonce: &'a str,
    /// Request MAC.
    pub mac: &'a [u8],
}

impl Header {
    /// Set the `id` field.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidInput`] if the value contains control characters.
    pub fn with_id(mut self, id: impl Into<String>) -> AuthResult<Self> {
        self.id = Some(check_component("id", id.into())?);
        Ok(self)
    }

    /// Set the `ts` field.
    #[must_use]
    pub fn with_ts(mut self, ts: Timestamp) -> Self {
        self.ts = Some(ts);
        self
    }

    /// Set the `nonce` field.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidInput`] if the value contains control characters.
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> AuthResult<Self> {
        self.nonce = Some(check_component("nonce", nonce.into())?);
        Ok(self)
    }

    /// Set the `mac` field.
    #[must_use]
    pub fn with_mac(mut self, mac: impl Into<Vec<u8>>) -> Self {
        self.mac = Some(mac.into());
        self
    }

    /// Set or clear the `hash` field.
    #[must_use]
    pub fn with_hash(mut self, hash: Option<impl Into<Vec<u8>>>) -> Self {
        self.hash = hash.map(Into::into);
        self
    }

    /// Set or clear the `ext` field.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidInput`] if the value contains control characters.
    pub fn with_ext(mut self, ext: Option<impl Into<String>>) -> AuthResult<Self> {
        self.ext = check_optional("ext", ext)?;
        Ok(self)
    }

    /// Set or clear the `app` field.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidInput`] if the value contains control characters.
    pub fn with_app(mut self, app: Option<impl Into<String>>) -> AuthResult<Self> {
        self.app = check_optional("app", app)?;
        Ok(self)
    }

    /// Set or clear the `dlg` field.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidInput`] if the value contains control characters.
    pub fn with_dlg(mut self, dlg: Option<impl Into<String>>) -> AuthResult<Self> {
        self.dlg = check_optional("dlg", dlg)?;
        Ok(self)
    }

    /// Set the `tsm` field.
    #[must_use]
    pub fn with_tsm(mut self, tsm: impl Into<Vec<u8>>) -> Self {
        self.tsm = Some(tsm.into());
        self
    }

    /// Set the `error` field.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidInput`] if the value contains control characters.
    pub fn with_error(mut self, error: impl Into<String>) -> AuthResult<Self> {
        self.error = Some(check_component("error", error.into())?);
        Ok(self)
    }

    /// Parse a header value, with or without the leading `Hawk` scheme.
    ///
    /// Unknown attributes are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MalformedHeader`] on a foreign scheme, broken
    /// quoting, an unknown escape, a control character, a duplicated
    /// attribute, a non-numeric `ts`, or invalid base64 in `mac`, `hash` or `tsm`.
    pub fn parse(value: &str) -> AuthResult<Self> {
        let mut rest = strip_scheme(value)?;
        let mut header = Self::default();

        loop {
            rest = rest.trim_start_matches(|c: char| c == ',' || c.is_whitespace());
            if rest.is_empty() {
                break;
            }

            let (name, after_name) = rest
                .split_once('=')
                .ok_or_else(|| malformed("expected key=\"value\""))?;
            let name = name.trim();
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(malformed(format!("invalid attribute name {name:?}")));
            }

            let quoted = after_name
                .trim_start()
                .strip_prefix('"')
                .ok_or_else(|| malformed(format!("value of {name} must be quoted")))?;
            let (value, remainder) = read_quoted(quoted)?;

            let remainder = remainder.trim_start();
            if !remainder.is_empty() && !remainder.starts_with(',') {
                return Err(malformed(format!("expected ',' after {name}")));
            }
            rest = remainder;

            header.assign(name, value)?;
        }

        Ok(header)
    }

    /// Check that the fields required of a request header are present.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MalformedHeader`] naming the first missing field.
    pub fn require_request_fields(&self) -> AuthResult<RequestFields<'_>> {
        Ok(RequestFields {
            id: self.id.as_deref().ok_or_else(|| missing("id"))?,
            ts: self.ts.ok_or_else(|| missing("ts"))?,
            nonce: self.nonce.as_deref().ok_or_else(|| missing("nonce"))?,
            mac: self.mac.as_deref().ok_or_else(|| missing("mac"))?,
        })
    }

    /// Render the full header value, including the `Hawk` scheme.
    #[must_use]
    pub fn to_header_value(&self) -> String {
        let attributes = self.to_string();
        if attributes.is_empty() {
            SCHEME.to_owned()
        } else {
            format!("{SCHEME} {attributes}")
        }
    }

    fn assign(&mut self, name: &str, value: String) -> AuthResult<()> {
        match name {
            "id" => set_once(&mut self.id, name, value),
            "ts" => {
                let ts = value
                    .parse::<Timestamp>()
                    .map_err(|_| malformed("ts must be an integer"))?;
                set_once(&mut self.ts, name, ts)
            }
            "nonce" => set_once(&mut self.nonce, name, value),
            "mac" => set_once(&mut self.mac, name, decode_base64(name, &value)?),
            "hash" => set_once(&mut self.hash, name, decode_base64(name, &value)?),
            "ext" => set_once(&mut self.ext, name, value),
            "app" => set_once(&mut self.app, name, value),
            "dlg" => set_once(&mut self.dlg, name, value),
            "tsm" => set_once(&mut self.tsm, name, decode_base64(name, &value)?),
            "error" => set_once(&mut self.error, name, value),
            _ => {
                debug!(attribute = name, "Ignoring unknown Hawk attribute");
                Ok(())
            }
        }
    }
}

impl fmt::Display for Header {
    /// Format the attribute list without the `Hawk` scheme prefix.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = [
            ("id", self.id.clone()),
            ("ts", self.ts.map(|ts| ts.to_string())),
            ("nonce", self.nonce.clone()),
            ("mac", self.mac.as_ref().map(|mac| BASE64.encode(mac))),
            ("hash", self.hash.as_ref().map(|hash| BASE64.encode(hash))),
            ("ext", self.ext.clone()),
            ("app", self.app.clone()),
            ("dlg", self.dlg.clone()),
            ("tsm", self.tsm.as_ref().map(|tsm| BASE64.encode(tsm))),
            ("error", self.error.clone()),
        ];

        let mut sep = "";
        for (name, value) in fields {
            if let Some(value) = value {
                write!(f, "{sep}{name}=\"{}\"", escape(&value))?;
                sep = ", ";
            }
        }
        Ok(())
    }
}

impl FromStr for Header {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Escape a value for inclusion between double quotes.
#[must_use]
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if ESCAPED_CHARS.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Read a quoted value whose opening quote has been consumed.
///
/// Returns the unescaped value and the input following the closing quote.
fn read_quoted(input: &str) -> AuthResult<(String, &str)> {
    let mut value = String::new();
    let mut chars = input.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Ok((value, &input[i + 1..])),
            '\\' => match chars.next() {
                Some((_, escaped)) if ESCAPED_CHARS.contains(&escaped) => value.push(escaped),
                Some((_, other)) => return Err(malformed(format!("invalid escape \\{other}"))),
                None => break,
            },
            c if c.is_control() => return Err(malformed("control character in value")),
            c => value.push(c),
        }
    }
    Err(malformed("unterminated quoted value"))
}

/// Remove a leading `Hawk` scheme token, rejecting any other scheme.
fn strip_scheme(value: &str) -> AuthResult<&str> {
    let value = value.trim();
    if value.eq_ignore_ascii_case(SCHEME) {
        return Ok("");
    }
    if let Some((token, rest)) = value.split_once(char::is_whitespace) {
        let is_scheme = !token.is_empty()
            && token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            && !rest.trim_start().starts_with('=');
        if is_scheme {
            if token.eq_ignore_ascii_case(SCHEME) {
                return Ok(rest);
            }
            return Err(malformed(format!("unsupported scheme {token:?}")));
        }
    }
    Ok(value)
}

fn set_once<T>(slot: &mut Option<T>, name: &str, value: T) -> AuthResult<()> {
    if slot.is_some() {
        return Err(malformed(format!("duplicate attribute {name}")));
    }
    *slot = Some(value);
    Ok(())
}

fn decode_base64(name: &str, value: &str) -> AuthResult<Vec<u8>> {
    BASE64
        .decode(value)
        .map_err(|_| malformed(format!("{name} is not valid base64")))
}

fn check_component(name: &str, value: String) -> AuthResult<String> {
    if value.chars().any(char::is_control) {
        return Err(AuthError::InvalidInput(format!(
            "{name} must not contain control characters"
        )));
    }
    Ok(value)
}

fn check_optional(name: &str, value: Option<impl Into<String>>) -> AuthResult<Option<String>> {
    value.map(|v| check_component(name, v.into())).transpose()
}

fn malformed(reason: impl Into<String>) -> AuthError {
    AuthError::MalformedHeader(reason.into())
}

fn missing(field: &str) -> AuthError {
    malformed(format!("missing required attribute {field}"))
}
