// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Supabase auth and storage REST APIs.

use std::time::Duration;

use pixora_core::PixoraError;
use pixora_core::types::AuthUser;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    #[serde(default)]
    full_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignRequest {
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

#[derive(Debug, Serialize)]
struct RemoveRequest<'a> {
    prefixes: &'a [String],
}

#[derive(Debug, Clone)]
pub struct SupabaseClient {
    client: reqwest::Client,
    base_url: Url,
    service_role_key: String,
    timeout: Duration,
}

impl SupabaseClient {
    pub fn new(
        project_url: &str,
        service_role_key: &str,
        timeout: Duration,
    ) -> Result<Self, PixoraError> {
        let base_url = Url::parse(project_url)
            .map_err(|e| PixoraError::Config(format!("invalid supabase.url `{project_url}`: {e}")))?;
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(service_role_key)
                .map_err(|e| PixoraError::Config(format!("invalid Supabase key: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| PixoraError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url,
            service_role_key: service_role_key.to_string(),
            timeout,
        })
    }

    /// `{project}/{prefix...}/{segments...}` with each segment percent-encoded.
    fn endpoint(&self, prefix: &[&str], segments: &[&str]) -> Result<Url, PixoraError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| PixoraError::Config("supabase.url cannot be a base URL".into()))?
            .pop_if_empty()
            .extend(prefix)
            .extend(segments.iter().flat_map(|s| s.split('/')).filter(|s| !s.is_empty()));
        Ok(url)
    }

    /// Resolves an end-user access token. `None` when the token is rejected.
    pub async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, PixoraError> {
        let url = self.endpoint(&["auth", "v1", "user"], &[])?;
        let response = self
            .client
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let status = response.status();
        debug!(status = %status, "Supabase auth response received");
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Ok(None);
        }
        let user: UserResponse = self.decode(status, response).await?;
        Ok(Some(AuthUser {
            id: user.id,
            email: user.email.unwrap_or_default(),
            display_name: user.user_metadata.full_name,
        }))
    }

    /// Absolute signed download URL for `bucket/path`.
    pub async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in: u64,
    ) -> Result<String, PixoraError> {
        let url = self.endpoint(&["storage", "v1", "object", "sign"], &[bucket, path])?;
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.service_role_key)
            .json(&SignRequest { expires_in })
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        let status = response.status();
        let signed: SignResponse = self.decode(status, response).await?;

        // The API answers with a path relative to `/storage/v1`.
        let storage_root = self.endpoint(&["storage", "v1"], &[])?;
        Ok(format!(
            "{}{}",
            storage_root.as_str().trim_end_matches('/'),
            signed.signed_url
        ))
    }

    /// Uploads a new object. An existing object at `path` is not replaced.
    pub async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), PixoraError> {
        let url = self.endpoint(&["storage", "v1", "object"], &[bucket, path])?;
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.service_role_key)
            .header("content-type", content_type)
            .header("cache-control", "max-age=3600")
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        let status = response.status();
        let _: serde_json::Value = self.decode(status, response).await?;
        Ok(())
    }

    pub async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), PixoraError> {
        let url = self.endpoint(&["storage", "v1", "object"], &[bucket])?;
        let response = self
            .client
            .delete(url)
            .bearer_auth(&self.service_role_key)
            .json(&RemoveRequest { prefixes: paths })
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        let status = response.status();
        let _: serde_json::Value = self.decode(status, response).await?;
        Ok(())
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        &self,
        status: StatusCode,
        response: reqwest::Response,
    ) -> Result<T, PixoraError> {
        let text = response.text().await.map_err(|e| self.send_error(e))?;
        if !status.is_success() {
            return Err(PixoraError::provider(format!(
                "Supabase API returned {status}: {text}"
            )));
        }
        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str(text).map_err(|e| PixoraError::Provider {
            message: format!("failed to parse Supabase response: {e}"),
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
            message: format!("Supabase request failed: {e}"),
            source: Some(Box::new(e)),
        }
    }
}
