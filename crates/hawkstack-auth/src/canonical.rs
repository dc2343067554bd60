//! Normalized string construction for Hawk MACs.
//!
//! Every MAC in the protocol is computed over the same line-oriented layout:
//!
//! ```text
//! hawk.1.<kind>\n
//! <ts>\n
//! <nonce>\n
//! <METHOD>\n
//! <path-and-query>\n
//! <host>\n
//! <port>\n
//! <base64 payload hash>\n
//! <ext>\n
//! ```
//!
//! Absent optional fields are empty lines so that every field keeps its line
//! position. Client and server must produce byte-identical output for the
//! same logical inputs.

use std::fmt::Write as _;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hawkstack_core::Timestamp;

use crate::credentials::Key;
use crate::error::{AuthError, AuthResult};

/// Protocol header line prefix.
pub const HAWK_VERSION: &str = "hawk.1";

/// Which MAC a normalized string is built for (the first line of the message).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacKind {
    /// Client request `Authorization` header.
    Header,
    /// Server `Server-Authorization` header.
    Response,
    /// URL bewit.
    Bewit,
}

impl MacKind {
    fn label(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Response => "response",
            Self::Bewit => "bewit",
        }
    }
}

/// Inputs to a MAC calculation.
///
/// For responses, `ts` and `nonce` are the values of the request being
/// answered. For bewits, `ts` is the expiry and `nonce` is empty.
#[derive(Debug, Clone, Copy)]
pub struct MacParams<'a> {
    /// Which MAC is being computed.
    pub kind: MacKind,
    /// Timestamp in seconds.
    pub ts: Timestamp,
    /// Nonce; empty for bewits.
    pub nonce: &'a str,
    /// HTTP method.
    pub method: &'a str,
    /// Request host.
    pub host: &'a str,
    /// Request port.
    pub port: u16,
    /// Path and query string.
    pub path: &'a str,
    /// Payload hash, if the payload is covered.
    pub hash: Option<&'a [u8]>,
    /// Application-specific extension data.
    pub ext: Option<&'a str>,
}

/// Build the normalized string for `params`.
///
/// The method is uppercased and the host lowercased; every other field is
/// taken verbatim.
///
/// # Errors
///
/// Returns [`AuthError::InvalidInput`] if any field contains a line break.
///
/// # Examples
///
/// ```
/// use hawkstack_auth::canonical::{MacKind, MacParams, normalized_string};
///
/// let normalized = normalized_string(&MacParams {
///     kind: MacKind::Header,
///     ts: 1353832234,
///     nonce: "j4h3g2",
///     method: "GET",
///     host: "Example.com",
///     port: 8000,
///     path: "/resource/1?b=1&a=2",
///     hash: None,
///     ext: Some("some-app-ext-data"),
/// })
/// .unwrap();
/// assert_eq!(
///     normalized,
///     "hawk.1.header\n1353832234\nj4h3g2\nGET\n/resource/1?b=1&a=2\nexample.com\n8000\n\nsome-app-ext-data\n"
/// );
/// ```
pub fn normalized_string(params: &MacParams<'_>) -> AuthResult<String> {
    check_line("nonce", params.nonce)?;
    check_line("method", params.method)?;
    check_line("host", params.host)?;
    check_line("path", params.path)?;
    if let Some(ext) = params.ext {
        check_line("ext", ext)?;
    }

    let capacity = 64
        + params.nonce.len()
        + params.path.len()
        + params.host.len()
        + params.ext.map_or(0, str::len);
    let mut out = String::with_capacity(capacity);
    out.push_str(HAWK_VERSION);
    out.push('.');
    out.push_str(params.kind.label());
    out.push('\n');

    // Writing into a String cannot fail.
    let _ = writeln!(out, "{}", params.ts);
    out.push_str(params.nonce);
    out.push('\n');
    out.push_str(&params.method.to_ascii_uppercase());
    out.push('\n');
    out.push_str(params.path);
    out.push('\n');
    out.push_str(&params.host.to_ascii_lowercase());
    out.push('\n');
    let _ = writeln!(out, "{}", params.port);
    if let Some(hash) = params.hash {
        BASE64.encode_string(hash, &mut out);
    }
    out.push('\n');
    if let Some(ext) = params.ext {
        out.push_str(ext);
    }
    out.push('\n');

    Ok(out)
}

/// Build the message MAC'd into the `tsm` field of a clock-resync challenge.
#[must_use]
pub fn timestamp_message(ts: Timestamp) -> String {
    format!("{HAWK_VERSION}.ts\n{ts}\n")
}

/// Compute the MAC for `params` under `key`.
///
/// # Errors
///
/// Returns [`AuthError::InvalidInput`] if the normalized string cannot be built.
pub fn calculate_mac(key: &Key, params: &MacParams<'_>) -> AuthResult<Vec<u8>> {
    let normalized = normalized_string(params)?;
    Ok(key.sign(normalized.as_bytes()))
}

/// Check `candidate` against the MAC for `params` in constant time.
///
/// # Errors
///
/// Returns [`AuthError::InvalidInput`] if the normalized string cannot be built.
pub fn verify_mac(key: &Key, params: &MacParams<'_>, candidate: &[u8]) -> AuthResult<bool> {
    let normalized = normalized_string(params)?;
    Ok(key.verify(normalized.as_bytes(), candidate))
}

fn check_line(field: &str, value: &str) -> AuthResult<()> {
    if value.contains(['\n', '\r']) {
        return Err(AuthError::InvalidInput(format!(
            "{field} must not contain line breaks"
        )));
    }
    Ok(())
}
