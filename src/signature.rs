//! Stripe webhook signature verification.
//!
//! Verifies the `Stripe-Signature` header against an HMAC-SHA256
//! recomputation over the exact raw request body. The body must not be
//! parsed before this check succeeds.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{Result, WebhookError};
use crate::event::Event;

/// Maximum accepted age of the signature timestamp, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Verify the webhook signature and parse the event.
///
/// # Arguments
/// * `payload` - The raw request body
/// * `signature` - The `Stripe-Signature` header value
/// * `secret` - The signing secret shared with Stripe
///
/// # Errors
/// Returns a [`WebhookError::Signature`] if the header is malformed, the
/// timestamp is outside tolerance, the signature does not match, or the
/// verified payload is not a valid event envelope.
pub fn verify_event(payload: &[u8], signature: &str, secret: &SecretString) -> Result<Event> {
    let sig_parts = parse_signature_header(signature)?;

    // Reject stale timestamps to limit replay of captured deliveries.
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0) as i64;

    if (now - sig_parts.timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(WebhookError::signature("Webhook timestamp too old"));
    }

    let signed_payload = format!(
        "{}.{}",
        sig_parts.timestamp,
        String::from_utf8_lossy(payload)
    );
    let expected_sig = compute_signature(secret.expose_secret(), signed_payload.as_bytes());

    let expected_bytes =
        hex::decode(&expected_sig).map_err(|_| WebhookError::signature("Hex decode error"))?;
    let provided_bytes = hex::decode(&sig_parts.signature)
        .map_err(|_| WebhookError::signature("Invalid signature format"))?;

    if expected_bytes.ct_eq(&provided_bytes).unwrap_u8() != 1 {
        return Err(WebhookError::signature("Invalid webhook signature"));
    }

    // Parse only after the signature checks out. Log the parse detail but
    // keep the response message generic.
    let event: Event = serde_json::from_slice(payload).map_err(|e| {
        tracing::warn!(error = %e, "failed to parse verified webhook payload");
        WebhookError::signature("Malformed event payload")
    })?;

    Ok(event)
}

/// Parsed signature header parts.
struct SignatureParts {
    timestamp: i64,
    signature: String,
}

/// Parse the `Stripe-Signature` header (`t=<ts>,v1=<hex>,...`).
fn parse_signature_header(header: &str) -> Result<SignatureParts> {
    let mut timestamp = None;
    let mut signature = None;

    for part in header.split(',') {
        let (key, value) = part
            .split_once('=')
            .ok_or_else(|| WebhookError::signature("Invalid signature header format"))?;

        match key.trim() {
            "t" => timestamp = value.parse().ok(),
            "v1" => signature = Some(value.to_string()),
            _ => {} // Ignore other scheme versions
        }
    }

    Ok(SignatureParts {
        timestamp: timestamp
            .ok_or_else(|| WebhookError::signature("Missing timestamp in signature"))?,
        signature: signature
            .ok_or_else(|| WebhookError::signature("Missing v1 signature"))?,
    })
}

/// Compute a hex-encoded HMAC-SHA256 signature.
fn compute_signature(secret: &str, payload: &[u8]) -> String {
    type HmacSha256 = Hmac<Sha256>;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Build a `Stripe-Signature` header value for a payload.
///
/// Exposed for tests and local tooling that need to fabricate deliveries.
pub fn sign_payload(secret: &SecretString, payload: &[u8], timestamp: i64) -> String {
    let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));
    let sig = compute_signature(secret.expose_secret(), signed_payload.as_bytes());
    format!("t={},v1={}", timestamp, sig)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str =
        r#"{"id":"evt_123","type":"checkout.session.completed","data":{"object":{}},"created":1234567890}"#;

    fn secret() -> SecretString {
        SecretString::from("whsec_test_secret")
    }

    fn now() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64
    }

    #[test]
    fn parses_signature_header() {
        let parts = parse_signature_header("t=1234567890,v1=abc123def456").unwrap();
        assert_eq!(parts.timestamp, 1234567890);
        assert_eq!(parts.signature, "abc123def456");
    }

    #[test]
    fn rejects_unparseable_header() {
        assert!(parse_signature_header("invalid").is_err());
    }

    #[test]
    fn rejects_header_without_v1() {
        assert!(parse_signature_header("t=1234567890,v0=abc").is_err());
    }

    #[test]
    fn accepts_valid_signature() {
        let secret = secret();
        let header = sign_payload(&secret, PAYLOAD.as_bytes(), now());

        let event = verify_event(PAYLOAD.as_bytes(), &header, &secret).unwrap();
        assert_eq!(event.id, "evt_123");
        assert_eq!(event.event_type, "checkout.session.completed");
    }

    #[test]
    fn rejects_wrong_signature() {
        let header = format!("t={},v1=deadbeef", now());
        let result = verify_event(PAYLOAD.as_bytes(), &header, &secret());
        assert!(result.is_err());
    }

    #[test]
    fn rejects_signature_over_different_body() {
        let secret = secret();
        let header = sign_payload(&secret, b"some other body", now());
        assert!(verify_event(PAYLOAD.as_bytes(), &header, &secret).is_err());
    }

    #[test]
    fn rejects_old_timestamp() {
        let secret = secret();
        let header = sign_payload(&secret, PAYLOAD.as_bytes(), 1_000_000_000);
        let err = verify_event(PAYLOAD.as_bytes(), &header, &secret).unwrap_err();
        assert_eq!(err.to_string(), "Webhook Error: Webhook timestamp too old");
    }

    #[test]
    fn rejects_non_hex_signature_value() {
        let header = format!("t={},v1=not-hex!", now());
        assert!(verify_event(PAYLOAD.as_bytes(), &header, &secret()).is_err());
    }

    #[test]
    fn rejects_verified_but_malformed_payload() {
        let secret = secret();
        let body = b"not json at all";
        let header = sign_payload(&secret, body, now());
        let err = verify_event(body, &header, &secret).unwrap_err();
        assert_eq!(err.to_string(), "Webhook Error: Malformed event payload");
    }
}
