// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for PayPal OAuth and Orders v2.

use std::time::Duration;

use pixora_core::PixoraError;
use pixora_core::types::PaymentOrder;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Refresh the access token this long before PayPal says it expires.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug)]
struct CachedToken {
    value: String,
    refresh_at: Instant,
}

#[derive(Debug)]
pub struct PaypalClient {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    timeout: Duration,
    token: Mutex<Option<CachedToken>>,
}

impl PaypalClient {
    pub fn new(
        client_id: &str,
        client_secret: &str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, PixoraError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PixoraError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            timeout,
            token: Mutex::new(None),
        })
    }

    /// A valid access token, fetched with client credentials when the cached
    /// one is missing or about to expire.
    async fn access_token(&self) -> Result<String, PixoraError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref()
            && Instant::now() < token.refresh_at
        {
            return Ok(token.value.clone());
        }

        let response = self
            .client
            .post(format!("{}/v1/oauth2/token", self.base_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        let token: TokenResponse = self.decode(response).await?;
        debug!(expires_in = token.expires_in, "PayPal access token refreshed");

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }

    pub async fn create_order(&self, amount: &str, currency: &str) -> Result<PaymentOrder, PixoraError> {
        let body = json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "amount": { "currency_code": currency, "value": amount }
            }]
        });
        let token = self.access_token().await?;
        let response = self
            .client
            .post(format!("{}/v2/checkout/orders", self.base_url))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        self.order(response).await
    }

    pub async fn capture_order(&self, order_id: &str) -> Result<PaymentOrder, PixoraError> {
        let token = self.access_token().await?;
        let response = self
            .client
            .post(format!("{}/v2/checkout/orders/{order_id}/capture", self.base_url))
            .bearer_auth(token)
            .json(&json!({}))
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        self.order(response).await
    }

    async fn order(&self, response: reqwest::Response) -> Result<PaymentOrder, PixoraError> {
        let raw: serde_json::Value = self.decode(response).await?;
        let field = |name: &str| raw.get(name).and_then(|v| v.as_str()).map(str::to_string);
        let (Some(id), Some(status)) = (field("id"), field("status")) else {
            return Err(PixoraError::provider("PayPal order response lacks id or status"));
        };
        Ok(PaymentOrder { id, status, raw })
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, PixoraError> {
        let status = response.status();
        let text = response.text().await.map_err(|e| self.send_error(e))?;
        if !status.is_success() {
            return Err(PixoraError::provider(format!(
                "PayPal API returned {status}: {text}"
            )));
        }
        serde_json::from_str(&text).map_err(|e| PixoraError::Provider {
            message: format!("failed to parse PayPal response: {e}"),
            source: Some(Box::new(e)),
        })
    }

    fn send_error(&self, e: reqwest::Error) -> PixoraError {
        if e.is_timeout() {
            return PixoraError::Timeout {
                duration: self.timeout,
            };
        }
        PixoraError::Provider {
            message: format!("PayPal request failed: {e}"),
            source: Some(Box::new(e)),
        }
    }
}
