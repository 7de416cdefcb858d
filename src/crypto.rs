//! Webhook signature verification.
//!
//! WooCommerce signs each delivery with HMAC-SHA256 over the raw request
//! body and sends the base64-encoded digest in `x-wc-webhook-signature`.
//! Verification must run against the exact bytes received, before any JSON
//! decoding: re-encoding a parsed body changes whitespace and key order and
//! desynchronizes the MAC.

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Outcome of a signature verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureVerdict {
    /// Whether the signature matched the body.
    pub is_valid: bool,
    /// Failure description when verification did not pass.
    pub error_message: Option<String>,
}

impl SignatureVerdict {
    /// Creates a passing verdict.
    pub fn valid() -> Self {
        Self { is_valid: true, error_message: None }
    }

    /// Creates a failing verdict with a description.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self { is_valid: false, error_message: Some(message.into()) }
    }
}

/// Signature computation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// The secret could not be used as an HMAC key.
    InvalidSecret,
}

impl fmt::Display for SignatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSecret => write!(f, "invalid secret key"),
        }
    }
}

impl std::error::Error for SignatureError {}

/// Verifies a webhook signature against the raw request body.
///
/// Recomputes the base64 HMAC-SHA256 of `payload` under `secret` and
/// compares it to the header-supplied `signature` in constant time.
///
/// # Example
///
/// ```
/// use coupon_relay::crypto::{sign_payload, verify_signature};
///
/// let body = br#"{"total":"49.90"}"#;
/// let signature = sign_payload(body, "shared-secret").unwrap();
///
/// assert!(verify_signature(body, &signature, "shared-secret").is_valid);
/// ```
pub fn verify_signature(payload: &[u8], signature: &str, secret: &str) -> SignatureVerdict {
    if signature.is_empty() {
        return SignatureVerdict::invalid("signature header is empty");
    }

    if secret.is_empty() {
        return SignatureVerdict::invalid("secret key is empty");
    }

    let expected = match sign_payload(payload, secret) {
        Ok(sig) => sig,
        Err(err) => return SignatureVerdict::invalid(err.to_string()),
    };

    if timing_safe_eq(signature, &expected) {
        SignatureVerdict::valid()
    } else {
        SignatureVerdict::invalid("signature mismatch")
    }
}

/// Computes the base64-encoded HMAC-SHA256 of a payload.
///
/// This is the signature WooCommerce places in `x-wc-webhook-signature`;
/// tests use it to produce valid inbound requests.
///
/// # Errors
///
/// Returns `SignatureError::InvalidSecret` if the secret cannot be used as
/// an HMAC key.
pub fn sign_payload(payload: &[u8], secret: &str) -> Result<String, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidSecret)?;

    mac.update(payload);
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// Timing-safe string comparison to prevent timing attacks.
///
/// Accumulates byte XORs instead of short-circuiting so the comparison
/// does not leak how much of the expected signature matched.
fn timing_safe_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (a_byte, b_byte) in a.as_bytes().iter().zip(b.as_bytes()) {
        result |= a_byte ^ b_byte;
    }

    result == 0
}
