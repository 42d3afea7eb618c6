// Cryptographic utilities for anti-forgery tokens and session identifiers

use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Entropy of the anti-forgery state token in bytes (192 bits)
pub const STATE_TOKEN_BYTES: usize = 24;

/// Entropy of a session identifier in bytes (256 bits)
pub const SESSION_ID_BYTES: usize = 32;

/// Generate a cryptographically secure anti-forgery state token
///
/// This generates a more compact token with higher entropy than UUID v4:
/// - 24 bytes (192 bits) of entropy vs UUID's 122 bits
/// - `Base64URL` encoding results in 32 characters vs UUID's 36 characters
///
/// # Returns
///
/// A base64url-encoded string representing 24 bytes of cryptographically secure random data
#[must_use]
pub fn generate_state_token() -> String {
    generate_nonce(STATE_TOKEN_BYTES)
}

/// Generate an opaque session identifier
///
/// Session identifiers carry 256 bits of entropy and are delivered to the
/// browser only in signed form (see [`sign`]), so they are unguessable and
/// tamper-evident.
#[must_use]
pub fn generate_session_id() -> String {
    generate_nonce(SESSION_ID_BYTES)
}

/// Generate a cryptographically secure nonce of specified byte length
///
/// # Arguments
///
/// * `length` - Number of bytes to generate (recommended: 16-32 for most use cases)
///
/// # Returns
///
/// A base64url-encoded string representing the specified bytes of random data
#[must_use]
pub fn generate_nonce(length: usize) -> String {
    let mut nonce = vec![0u8; length];
    rand::rng().fill_bytes(&mut nonce);
    general_purpose::URL_SAFE_NO_PAD.encode(nonce)
}

/// Sign a value with HMAC-SHA256, returning the base64url-encoded tag
///
/// Used to make the session-id cookie tamper-evident.
///
/// # Errors
///
/// Returns an error if HMAC initialization rejects the key
pub fn sign(value: &str, key: &[u8]) -> Result<String> {
    let mut mac =
        <HmacSha256 as Mac>::new_from_slice(key).context("Invalid HMAC key length")?;
    mac.update(value.as_bytes());
    Ok(general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
}

/// Verify a base64url-encoded HMAC-SHA256 tag for a value
///
/// Comparison happens inside the `hmac` crate in constant time.
#[must_use]
pub fn verify(value: &str, tag: &str, key: &[u8]) -> bool {
    let Ok(tag_bytes) = general_purpose::URL_SAFE_NO_PAD.decode(tag) else {
        return false;
    };
    let Ok(mut mac) = <HmacSha256 as Mac>::new_from_slice(key) else {
        return false;
    };
    mac.update(value.as_bytes());
    mac.verify_slice(&tag_bytes).is_ok()
}
