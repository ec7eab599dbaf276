//! Webhook payload authenticity and event parsing.
//!
//! Signatures follow the Stripe scheme: a `t=<unix>,v1=<hex>` header where
//! `v1` is HMAC-SHA256 over `"{timestamp}.{raw_payload}"`. Verification
//! runs on the raw request bytes; parsing the body first and re-serializing
//! it would invalidate the signature.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{ProcessorError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted age for a webhook event.
const MAX_TIMESTAMP_AGE_SECS: i64 = 300;

/// Clock-skew tolerance for timestamps from the future.
const MAX_FUTURE_TOLERANCE_SECS: i64 = 60;

/// A parsed webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

/// The event's data envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

impl WebhookEvent {
    /// Extracts the payment intent id from the event object, if present.
    pub fn intent_id(&self) -> Option<&str> {
        self.data.object.get("id").and_then(|v| v.as_str())
    }
}

/// Parsed `t=...,v1=...` signature header.
#[derive(Debug)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub v1: Vec<u8>,
}

impl SignatureHeader {
    /// Parses a signature header, taking the first `v1` entry.
    pub fn parse(header: &str) -> Result<Self> {
        let mut timestamp = None;
        let mut v1 = None;

        for part in header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => {
                    timestamp = Some(value.parse::<i64>().map_err(|_| {
                        ProcessorError::SignatureInvalid("malformed timestamp".to_string())
                    })?);
                }
                Some(("v1", value)) if v1.is_none() => {
                    v1 = Some(hex_decode(value).ok_or_else(|| {
                        ProcessorError::SignatureInvalid("malformed v1 signature".to_string())
                    })?);
                }
                _ => {}
            }
        }

        match (timestamp, v1) {
            (Some(timestamp), Some(v1)) => Ok(Self { timestamp, v1 }),
            _ => Err(ProcessorError::SignatureInvalid(
                "missing t or v1 element".to_string(),
            )),
        }
    }
}

/// Verifies a raw payload against its signature header.
pub fn verify(secret: &str, payload: &[u8], header: &str) -> Result<()> {
    let header = SignatureHeader::parse(header)?;

    let now = chrono::Utc::now().timestamp();
    let age = now - header.timestamp;
    if age > MAX_TIMESTAMP_AGE_SECS {
        tracing::warn!(age_secs = age, "webhook event too old, rejecting");
        return Err(ProcessorError::SignatureInvalid(format!(
            "event too old ({age} seconds)"
        )));
    }
    if age < -MAX_FUTURE_TOLERANCE_SECS {
        tracing::warn!(
            event_timestamp = header.timestamp,
            "webhook event timestamp in the future, rejecting"
        );
        return Err(ProcessorError::SignatureInvalid(
            "event timestamp in future".to_string(),
        ));
    }

    let expected = compute_signature(secret, header.timestamp, payload);
    if expected.ct_eq(header.v1.as_slice()).unwrap_u8() != 1 {
        return Err(ProcessorError::SignatureInvalid(
            "signature mismatch".to_string(),
        ));
    }

    Ok(())
}

/// Parses a verified payload into a [`WebhookEvent`].
pub fn parse_event(payload: &[u8]) -> Result<WebhookEvent> {
    serde_json::from_slice(payload)
        .map_err(|e| ProcessorError::InvalidResponse(format!("invalid event payload: {e}")))
}

/// Produces a `t=...,v1=...` header for a payload, as the gateway would.
///
/// Counterpart to [`verify`]; used by the in-memory processor and tests.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let signature = compute_signature(secret, timestamp, payload);
    format!("t={timestamp},v1={}", hex_encode(&signature))
}

fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> Vec<u8> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn hex_decode(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";

    #[test]
    fn valid_signature_verifies() {
        let payload = br#"{"id":"evt_1","type":"payment_intent.succeeded","data":{"object":{"id":"pi_1"}}}"#;
        let header = sign_payload(SECRET, chrono::Utc::now().timestamp(), payload);
        assert!(verify(SECRET, payload, &header).is_ok());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let payload = br#"{"id":"evt_1"}"#;
        let header = sign_payload("whsec_other", chrono::Utc::now().timestamp(), payload);
        let err = verify(SECRET, payload, &header).unwrap_err();
        assert!(matches!(err, ProcessorError::SignatureInvalid(_)));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let payload = br#"{"amount":1000}"#;
        let header = sign_payload(SECRET, chrono::Utc::now().timestamp(), payload);
        let result = verify(SECRET, br#"{"amount":9000}"#, &header);
        assert!(result.is_err());
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let payload = br#"{}"#;
        let old = chrono::Utc::now().timestamp() - 600;
        let header = sign_payload(SECRET, old, payload);
        let err = verify(SECRET, payload, &header).unwrap_err();
        assert!(err.to_string().contains("too old"));
    }

    #[test]
    fn future_timestamp_beyond_skew_is_rejected() {
        let payload = br#"{}"#;
        let future = chrono::Utc::now().timestamp() + 120;
        let header = sign_payload(SECRET, future, payload);
        assert!(verify(SECRET, payload, &header).is_err());
    }

    #[test]
    fn small_clock_skew_is_tolerated() {
        let payload = br#"{}"#;
        let slightly_ahead = chrono::Utc::now().timestamp() + 30;
        let header = sign_payload(SECRET, slightly_ahead, payload);
        assert!(verify(SECRET, payload, &header).is_ok());
    }

    #[test]
    fn malformed_header_is_rejected() {
        assert!(SignatureHeader::parse("not-a-header").is_err());
        assert!(SignatureHeader::parse("t=abc,v1=00").is_err());
        assert!(SignatureHeader::parse("t=123,v1=zz").is_err());
    }

    #[test]
    fn event_parsing_extracts_intent_id() {
        let payload = br#"{
            "id": "evt_42",
            "type": "payment_intent.succeeded",
            "data": {"object": {"id": "pi_42", "status": "succeeded"}}
        }"#;
        let event = parse_event(payload).unwrap();
        assert_eq!(event.id, "evt_42");
        assert_eq!(event.event_type, "payment_intent.succeeded");
        assert_eq!(event.intent_id(), Some("pi_42"));
    }

    #[test]
    fn event_without_object_id_yields_none() {
        let payload = br#"{"id":"evt_1","type":"charge.updated","data":{"object":{}}}"#;
        let event = parse_event(payload).unwrap();
        assert_eq!(event.intent_id(), None);
    }
}
