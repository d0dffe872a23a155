// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signature verification for inbound training webhooks.
//!
//! The provider signs `{webhook-id}.{webhook-timestamp}.{raw body}` with
//! HMAC-SHA256. The key is the base64 text after the `whsec_` prefix of the
//! signing secret. `webhook-signature` holds one or more space-separated
//! `v1,<base64 digest>` tokens; any one matching is enough.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use pixora_core::PixoraError;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

const SECRET_PREFIX: &str = "whsec_";

/// The three signature headers of a webhook delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookHeaders {
    pub id: String,
    pub timestamp: String,
    pub signature: String,
}

/// Verifies webhook signatures against one signing secret.
#[derive(Clone)]
pub struct WebhookVerifier {
    mac: HmacSha256,
    tolerance: Duration,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("key", &"[redacted]")
            .field("tolerance", &self.tolerance)
            .finish()
    }
}

impl WebhookVerifier {
    /// Build a verifier from a `whsec_<base64>` secret.
    pub fn new(secret: &str, tolerance: Duration) -> Result<Self, PixoraError> {
        let encoded = secret.strip_prefix(SECRET_PREFIX).ok_or_else(|| {
            PixoraError::Config(format!("webhook signing secret must start with `{SECRET_PREFIX}`"))
        })?;
        let key = STANDARD
            .decode(encoded)
            .map_err(|e| PixoraError::Config(format!("webhook signing secret is not base64: {e}")))?;
        let mac = HmacSha256::new_from_slice(&key)
            .map_err(|e| PixoraError::Config(format!("webhook signing key rejected: {e}")))?;
        Ok(Self { mac, tolerance })
    }

    /// Verify a delivery against the current wall clock.
    pub fn verify(&self, headers: &WebhookHeaders, body: &[u8]) -> Result<(), PixoraError> {
        self.verify_at(headers, body, chrono::Utc::now().timestamp())
    }

    /// Verify a delivery as of `now` (unix seconds).
    pub fn verify_at(
        &self,
        headers: &WebhookHeaders,
        body: &[u8],
        now: i64,
    ) -> Result<(), PixoraError> {
        if headers.id.is_empty() || headers.timestamp.is_empty() || headers.signature.is_empty() {
            return Err(PixoraError::Unauthenticated(
                "missing webhook signature headers".into(),
            ));
        }

        let sent_at: i64 = headers
            .timestamp
            .trim()
            .parse()
            .map_err(|_| PixoraError::Unauthenticated("malformed webhook timestamp".into()))?;
        if now.abs_diff(sent_at) > self.tolerance.as_secs() {
            return Err(PixoraError::Unauthenticated(
                "webhook timestamp outside tolerance".into(),
            ));
        }

        let expected = self.digest(&headers.id, &headers.timestamp, body);
        let matched = headers
            .signature
            .split_whitespace()
            .filter_map(|token| token.split_once(','))
            .filter_map(|(_version, sig)| STANDARD.decode(sig).ok())
            .any(|candidate| bool::from(candidate.as_slice().ct_eq(expected.as_slice())));

        if matched {
            Ok(())
        } else {
            Err(PixoraError::Unauthenticated("invalid webhook signature".into()))
        }
    }

    /// Produce a `v1,<base64>` signature token for a delivery.
    pub fn sign(&self, id: &str, timestamp: &str, body: &[u8]) -> String {
        format!("v1,{}", STANDARD.encode(self.digest(id, timestamp, body)))
    }

    fn digest(&self, id: &str, timestamp: &str, body: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body);
        mac.finalize().into_bytes().to_vec()
    }
}
