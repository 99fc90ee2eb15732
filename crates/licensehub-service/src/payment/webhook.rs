//! Webhook signature verification.
//!
//! The provider signs `"{timestamp}.{body}"` with HMAC-SHA256 and sends
//! `Stripe-Signature: t=<unix>,v1=<hex>[,v1=<hex>...]`.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Why a webhook signature was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookError {
    /// Header missing or unparsable.
    #[error("Malformed signature header")]
    MalformedHeader,
    /// Timestamp outside the tolerance window.
    #[error("Signature timestamp outside tolerance")]
    StaleTimestamp,
    /// No `v1` signature matched.
    #[error("Signature mismatch")]
    Mismatch,
    /// The signing secret could not be used.
    #[error("Webhook secret is not configured")]
    NotConfigured,
}

/// Verifies provider webhook signatures.
#[derive(Debug, Clone)]
pub struct WebhookVerifier {
    secret: String,
    tolerance_seconds: i64,
}

impl WebhookVerifier {
    /// Creates a verifier.
    pub fn new(secret: impl Into<String>, tolerance_seconds: i64) -> Self {
        Self {
            secret: secret.into(),
            tolerance_seconds,
        }
    }

    /// Check `header` against `payload` at time `now`.
    pub fn verify(
        &self,
        header: &str,
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> Result<(), WebhookError> {
        if self.secret.is_empty() {
            return Err(WebhookError::NotConfigured);
        }

        let mut timestamp = None;
        let mut signatures = Vec::new();
        for part in header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
                Some(("v1", value)) => signatures.push(value),
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(WebhookError::MalformedHeader)?;
        if signatures.is_empty() {
            return Err(WebhookError::MalformedHeader);
        }
        let tolerance = u64::try_from(self.tolerance_seconds).unwrap_or(0);
        if now.timestamp().abs_diff(timestamp) > tolerance {
            return Err(WebhookError::StaleTimestamp);
        }

        let mac = self.mac(timestamp, payload)?;
        let matched = signatures.iter().any(|sig| {
            hex::decode(sig)
                .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
                .unwrap_or(false)
        });

        if matched {
            Ok(())
        } else {
            Err(WebhookError::Mismatch)
        }
    }

    /// Produce a header value for `payload` signed at `timestamp`.
    pub fn sign(&self, payload: &[u8], timestamp: i64) -> Result<String, WebhookError> {
        let mac = self.mac(timestamp, payload)?;
        Ok(format!(
            "t={timestamp},v1={}",
            hex::encode(mac.finalize().into_bytes())
        ))
    }

    fn mac(&self, timestamp: i64, payload: &[u8]) -> Result<HmacSha256, WebhookError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|_| WebhookError::NotConfigured)?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    const BODY: &[u8] = br#"{"type":"checkout.session.completed"}"#;

    #[test]
    fn test_valid_signature() {
        let verifier = WebhookVerifier::new("whsec_test", 300);
        let now = Utc::now();
        let header = verifier.sign(BODY, now.timestamp()).unwrap();
        assert_eq!(verifier.verify(&header, BODY, now), Ok(()));
    }

    #[test]
    fn test_tampered_body_is_rejected() {
        let verifier = WebhookVerifier::new("whsec_test", 300);
        let now = Utc::now();
        let header = verifier.sign(BODY, now.timestamp()).unwrap();
        assert_eq!(
            verifier.verify(&header, b"{}", now),
            Err(WebhookError::Mismatch)
        );
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let now = Utc::now();
        let header = WebhookVerifier::new("other", 300)
            .sign(BODY, now.timestamp())
            .unwrap();
        assert_eq!(
            WebhookVerifier::new("whsec_test", 300).verify(&header, BODY, now),
            Err(WebhookError::Mismatch)
        );
    }

    #[test]
    fn test_stale_timestamp_is_rejected() {
        let verifier = WebhookVerifier::new("whsec_test", 300);
        let signed_at = Utc::now() - Duration::seconds(600);
        let header = verifier.sign(BODY, signed_at.timestamp()).unwrap();
        assert_eq!(
            verifier.verify(&header, BODY, Utc::now()),
            Err(WebhookError::StaleTimestamp)
        );
    }

    #[test]
    fn test_malformed_header() {
        let verifier = WebhookVerifier::new("whsec_test", 300);
        assert_eq!(
            verifier.verify("v1=abc", BODY, Utc::now()),
            Err(WebhookError::MalformedHeader)
        );
        assert_eq!(
            verifier.verify("t=123", BODY, Utc::now()),
            Err(WebhookError::MalformedHeader)
        );
    }

    #[test]
    fn test_empty_secret_rejects_everything() {
        let verifier = WebhookVerifier::new("", 300);
        assert_eq!(
            verifier.verify("t=1,v1=00", BODY, Utc::now()),
            Err(WebhookError::NotConfigured)
        );
    }

    #[test]
    fn test_extreme_timestamps_are_stale() {
        let verifier = WebhookVerifier::new("whsec_test", 300);
        let now = Utc::now();
        for header in [
            "t=-9223372036854775808,v1=00",
            "t=9223372036854775807,v1=00",
        ] {
            assert_eq!(
                verifier.verify(header, BODY, now),
                Err(WebhookError::StaleTimestamp)
            );
        }
        assert_eq!(
            verifier.verify("t=99999999999999999999,v1=00", BODY, now),
            Err(WebhookError::MalformedHeader)
        );
    }
}
