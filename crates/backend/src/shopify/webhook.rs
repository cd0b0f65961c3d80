//! Shopify webhook signature verification.
//!
//! Shopify signs every webhook body with the app secret (HMAC-SHA256) and
//! sends the base64 digest in `X-Shopify-Hmac-Sha256`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;

/// Header carrying the webhook signature.
pub const HMAC_HEADER: &str = "x-shopify-hmac-sha256";

/// Header carrying the webhook topic (e.g. `orders/create`).
pub const TOPIC_HEADER: &str = "x-shopify-topic";

/// Header carrying the sending shop's domain.
pub const SHOP_DOMAIN_HEADER: &str = "x-shopify-shop-domain";

type HmacSha256 = Hmac<Sha256>;

/// Webhook signature check failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("missing signature header")]
    MissingSignature,
    #[error("signature mismatch")]
    SignatureMismatch,
    #[error("invalid signing key")]
    InvalidKey,
}

/// Base64 HMAC-SHA256 of `body` under `secret`.
///
/// # Errors
///
/// Returns `WebhookError::InvalidKey` if the key is rejected by the MAC.
pub fn sign(secret: &SecretString, body: &[u8]) -> Result<String, WebhookError> {
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|_| WebhookError::InvalidKey)?;
    mac.update(body);
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Verify `signature` (the header value) against `body`.
///
/// # Errors
///
/// Returns `WebhookError::MissingSignature` when no header was sent and
/// `WebhookError::SignatureMismatch` when it does not match.
pub fn verify(
    secret: &SecretString,
    body: &[u8],
    signature: Option<&str>,
) -> Result<(), WebhookError> {
    let signature = signature
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(WebhookError::MissingSignature)?;

    let expected = sign(secret, body)?;
    if !constant_time_compare(&expected, signature) {
        return Err(WebhookError::SignatureMismatch);
    }
    Ok(())
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}
