//! MAC engine.
//!
//! Computes and verifies HMACs over normalized strings. The algorithm is a
//! closed enum, dispatched with an exhaustive match; verification always
//! goes through a constant-time comparison. Base64 encoding of the result
//! happens at the header and bewit boundaries, not here.

use digest::KeyInit;
use hawkstack_core::Algorithm;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;
type HmacSha384 = Hmac<Sha384>;
type HmacSha512 = Hmac<Sha512>;

/// Compute the HMAC of `message` under `key` with `algorithm`.
///
/// # Examples
///
/// ```
/// use hawkstack_auth::mac::{sign, verify};
/// use hawkstack_core::Algorithm;
///
/// let tag = sign(b"secret", Algorithm::Sha256, b"hawk.1.header\n");
/// assert_eq!(tag.len(), 32);
/// assert!(verify(b"secret", Algorithm::Sha256, b"hawk.1.header\n", &tag));
/// ```
#[must_use]
pub fn sign(key: &[u8], algorithm: Algorithm, message: &[u8]) -> Vec<u8> {
    match algorithm {
        Algorithm::Sha1 => hmac_bytes::<HmacSha1>(key, message),
        Algorithm::Sha256 => hmac_bytes::<HmacSha256>(key, message),
        Algorithm::Sha384 => hmac_bytes::<HmacSha384>(key, message),
        Algorithm::Sha512 => hmac_bytes::<HmacSha512>(key, message),
    }
}

/// Check `candidate` against the HMAC of `message` in constant time.
///
/// A candidate of the wrong length never matches.
#[must_use]
pub fn verify(key: &[u8], algorithm: Algorithm, message: &[u8], candidate: &[u8]) -> bool {
    let expected = sign(key, algorithm, message);
    constant_time_eq(&expected, candidate)
}

/// Compare two byte strings without short-circuiting on the first difference.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

fn hmac_bytes<M: Mac + KeyInit>(key: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac =
        <M as KeyInit>::new_from_slice(key).expect("HMAC can accept keys of any length");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}
