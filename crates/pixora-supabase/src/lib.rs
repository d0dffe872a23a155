// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Supabase adapter for Pixora: session tokens via the auth API and
//! training archives and generated images via the storage API.

pub mod client;

use std::time::Duration;

use async_trait::async_trait;
use pixora_config::model::SupabaseConfig;
use pixora_core::types::{AdapterType, AuthUser, HealthStatus};
use pixora_core::{IdentityProvider, ObjectStorage, PixoraError, PluginAdapter};
use tracing::{debug, info};

use crate::client::SupabaseClient;

/// Implements both [`IdentityProvider`] and [`ObjectStorage`].
pub struct SupabaseAdapter {
    client: SupabaseClient,
}

impl SupabaseAdapter {
    pub fn new(config: &SupabaseConfig) -> Result<Self, PixoraError> {
        let url = config
            .url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| PixoraError::Config("supabase.url is not set".into()))?;
        let key = config
            .service_role_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| PixoraError::Config("supabase.service_role_key is not set".into()))?;
        let client = SupabaseClient::new(url, key, Duration::from_secs(config.request_timeout_secs))?;
        info!(url, "Supabase adapter initialized");
        Ok(Self { client })
    }
}

#[async_trait]
impl PluginAdapter for SupabaseAdapter {
    fn name(&self) -> &str {
        "supabase"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Identity
    }

    async fn health_check(&self) -> Result<HealthStatus, PixoraError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl IdentityProvider for SupabaseAdapter {
    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, PixoraError> {
        self.client.get_user(access_token).await
    }
}

#[async_trait]
impl ObjectStorage for SupabaseAdapter {
    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in_secs: u64,
    ) -> Result<String, PixoraError> {
        self.client.create_signed_url(bucket, path, expires_in_secs).await
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), PixoraError> {
        let len = bytes.len();
        self.client.upload(bucket, path, bytes, content_type).await?;
        debug!(bucket, path, len, "object uploaded");
        Ok(())
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), PixoraError> {
        if paths.is_empty() {
            return Ok(());
        }
        self.client.remove(bucket, paths).await?;
        debug!(bucket, count = paths.len(), "objects removed");
        Ok(())
    }
}
