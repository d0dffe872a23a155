// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Correlation state carried in the training callback URL.
//!
//! The provider echoes the webhook URL verbatim, so the identifiers needed to
//! find the originating model record travel in its query string:
//! `user-id`, `model-name` and `file-path`. With a correlation secret the
//! URL also carries `expires` and `token`, an HMAC over the triple and the
//! expiry, so a leaked URL cannot be replayed forever or edited to point at
//! another user's record.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use pixora_core::PixoraError;
use sha2::Sha256;
use url::Url;

type HmacSha256 = Hmac<Sha256>;

pub const USER_ID_PARAM: &str = "user-id";
pub const MODEL_NAME_PARAM: &str = "model-name";
pub const FILE_PATH_PARAM: &str = "file-path";
pub const EXPIRES_PARAM: &str = "expires";
pub const TOKEN_PARAM: &str = "token";

/// Identifiers binding a webhook to the request that started the training.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Correlation {
    pub user_id: String,
    pub model_name: String,
    /// Object path of the uploaded archive inside the training bucket.
    pub file_path: String,
}

/// Correlation plus the optional signed expiry, as parsed from a callback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub correlation: Correlation,
    pub expires: Option<String>,
    pub token: Option<String>,
}

/// Append the correlation triple (and a token, when `signer` is set) to `base`.
pub fn build_callback_url(
    base: &str,
    correlation: &Correlation,
    signer: Option<&CorrelationSigner>,
    now: i64,
) -> Result<String, PixoraError> {
    let mut url = Url::parse(base)
        .map_err(|e| PixoraError::Config(format!("invalid webhook base URL `{base}`: {e}")))?;
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair(USER_ID_PARAM, &correlation.user_id)
            .append_pair(MODEL_NAME_PARAM, &correlation.model_name)
            .append_pair(FILE_PATH_PARAM, &correlation.file_path);
        if let Some(signer) = signer {
            let expires = signer.expiry(now);
            query
                .append_pair(EXPIRES_PARAM, &expires.to_string())
                .append_pair(TOKEN_PARAM, &signer.token(correlation, expires));
        }
    }
    Ok(url.into())
}

/// Parse the callback parameters out of a raw query string.
///
/// Pure parse, no lookups: absent keys come back as empty strings and later
/// lookups simply find nothing.
pub fn extract(query: &str) -> CallbackParams {
    let mut params = CallbackParams::default();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            USER_ID_PARAM => params.correlation.user_id = value.into_owned(),
            MODEL_NAME_PARAM => params.correlation.model_name = value.into_owned(),
            FILE_PATH_PARAM => params.correlation.file_path = value.into_owned(),
            EXPIRES_PARAM => params.expires = Some(value.into_owned()),
            TOKEN_PARAM => params.token = Some(value.into_owned()),
            _ => {}
        }
    }
    params
}

/// Parse the callback parameters out of a full URL.
pub fn extract_from_url(callback_url: &str) -> Result<CallbackParams, PixoraError> {
    let url = Url::parse(callback_url)
        .map_err(|e| PixoraError::Validation(format!("invalid callback URL: {e}")))?;
    Ok(extract(url.query().unwrap_or_default()))
}

/// Signs and checks correlation tokens.
#[derive(Clone)]
pub struct CorrelationSigner {
    mac: HmacSha256,
    ttl: Duration,
}

impl std::fmt::Debug for CorrelationSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorrelationSigner")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl CorrelationSigner {
    pub fn new(secret: &str, ttl: Duration) -> Result<Self, PixoraError> {
        if secret.is_empty() {
            return Err(PixoraError::Config("correlation secret must not be empty".into()));
        }
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| PixoraError::Config(format!("correlation secret rejected: {e}")))?;
        Ok(Self { mac, ttl })
    }

    fn expiry(&self, now: i64) -> i64 {
        now.saturating_add(i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX))
    }

    fn keyed(&self, correlation: &Correlation, expires: i64) -> HmacSha256 {
        let mut mac = self.mac.clone();
        // Length-prefix each field so `a|bc` and `ab|c` cannot collide.
        for field in [
            correlation.user_id.as_str(),
            correlation.model_name.as_str(),
            correlation.file_path.as_str(),
        ] {
            mac.update(&(field.len() as u64).to_be_bytes());
            mac.update(field.as_bytes());
        }
        mac.update(&expires.to_be_bytes());
        mac
    }

    pub fn token(&self, correlation: &Correlation, expires: i64) -> String {
        URL_SAFE_NO_PAD.encode(self.keyed(correlation, expires).finalize().into_bytes())
    }

    /// Check the token and expiry of parsed callback parameters as of `now`.
    pub fn verify(&self, params: &CallbackParams, now: i64) -> Result<(), PixoraError> {
        let (Some(expires), Some(token)) = (&params.expires, &params.token) else {
            return Err(PixoraError::Unauthenticated("missing correlation token".into()));
        };
        let expires: i64 = expires
            .parse()
            .map_err(|_| PixoraError::Unauthenticated("malformed correlation expiry".into()))?;
        if now > expires {
            return Err(PixoraError::Unauthenticated("correlation token expired".into()));
        }
        let raw = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| PixoraError::Unauthenticated("malformed correlation token".into()))?;
        self.keyed(&params.correlation, expires)
            .verify_slice(&raw)
            .map_err(|_| PixoraError::Unauthenticated("invalid correlation token".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://pixora.app/api/webhooks/training";
    const NOW: i64 = 1_700_000_000;

    fn sample() -> Correlation {
        Correlation {
            user_id: "0b6f3c1e-8d0a-4a8e-9a57-2d4f1f5b9c11".into(),
            model_name: "My Cat: v2/final".into(),
            file_path: "0b6f3c1e/cats & dogs.zip".into(),
        }
    }

    #[test]
    fn plain_url_round_trips() {
        let url = build_callback_url(BASE, &sample(), None, NOW).unwrap();
        assert!(url.starts_with(BASE));
        let params = extract_from_url(&url).unwrap();
        assert_eq!(params.correlation, sample());
        assert!(params.token.is_none());
    }

    #[test]
    fn missing_keys_are_empty() {
        let params = extract("model-name=cats");
        assert_eq!(params.correlation.user_id, "");
        assert_eq!(params.correlation.model_name, "cats");
        assert_eq!(params.correlation.file_path, "");
        assert_eq!(extract("").correlation, Correlation::default());
    }

    #[test]
    fn signed_url_verifies() {
        let signer = CorrelationSigner::new("corr-secret", Duration::from_secs(3600)).unwrap();
        let url = build_callback_url(BASE, &sample(), Some(&signer), NOW).unwrap();
        let params = extract_from_url(&url).unwrap();
        assert_eq!(params.correlation, sample());
        assert!(signer.verify(&params, NOW + 10).is_ok());
    }

    #[test]
    fn tampered_or_expired_token_is_rejected() {
        let signer = CorrelationSigner::new("corr-secret", Duration::from_secs(3600)).unwrap();
        let url = build_callback_url(BASE, &sample(), Some(&signer), NOW).unwrap();
        let params = extract_from_url(&url).unwrap();

        let mut tampered = params.clone();
        tampered.correlation.user_id = "someone-else".into();
        assert!(signer.verify(&tampered, NOW).is_err());

        assert!(signer.verify(&params, NOW + 3601).is_err());

        let unsigned = extract_from_url(&build_callback_url(BASE, &sample(), None, NOW).unwrap())
            .unwrap();
        assert!(signer.verify(&unsigned, NOW).is_err());
    }

    #[test]
    fn invalid_base_is_config_error() {
        let err = build_callback_url("not a url", &sample(), None, NOW).unwrap_err();
        assert!(matches!(err, PixoraError::Config(_)));
    }
}
