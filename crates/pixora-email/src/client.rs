// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Resend emails API.

use std::time::Duration;

use pixora_core::PixoraError;
use pixora_core::types::EmailMessage;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Request timeout for email sends.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    name: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Clone)]
pub struct ResendClient {
    client: reqwest::Client,
    base_url: String,
    from: String,
}

impl ResendClient {
    pub fn new(api_key: &str, base_url: &str, from: &str) -> Result<Self, PixoraError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| PixoraError::Config(format!("invalid email API key: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PixoraError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            from: from.to_string(),
        })
    }

    /// Sends `message` and returns the provider message id.
    pub async fn send(&self, message: &EmailMessage) -> Result<String, PixoraError> {
        let body = SendEmailRequest {
            from: &self.from,
            to: &message.to,
            subject: &message.subject,
            html: &message.html,
        };
        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(send_error)?;

        let status = response.status();
        debug!(status = %status, "email API response received");
        let text = response.text().await.map_err(send_error)?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ApiErrorResponse>(&text) {
                Ok(err) => format!("Resend API error ({}): {}", err.name, err.message),
                Err(_) => format!("email API returned {status}: {text}"),
            };
            return Err(PixoraError::provider(message));
        }

        let parsed: SendEmailResponse =
            serde_json::from_str(&text).map_err(|e| PixoraError::Provider {
                message: format!("failed to parse email API response: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(parsed.id)
    }
}

fn send_error(e: reqwest::Error) -> PixoraError {
    if e.is_timeout() {
        return PixoraError::Timeout {
            duration: REQUEST_TIMEOUT,
        };
    }
    PixoraError::Provider {
        message: format!("email request failed: {e}"),
        source: Some(Box::new(e)),
    }
}
