// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transactional email for Pixora.
//!
//! This crate implements [`EmailSender`] over the Resend REST API and owns
//! the training status notification templates.

pub mod client;
pub mod templates;

use async_trait::async_trait;
use pixora_config::model::EmailConfig;
use pixora_core::types::{AdapterType, EmailMessage, HealthStatus};
use pixora_core::{EmailSender, PixoraError, PluginAdapter};
use tracing::info;

use crate::client::ResendClient;

pub use templates::{TrainingNotice, training_status_email};

/// Resend-backed [`EmailSender`].
pub struct ResendEmailSender {
    client: ResendClient,
}

impl ResendEmailSender {
    /// Builds the sender from `[email]`. Fails when no API key is configured.
    pub fn new(config: &EmailConfig) -> Result<Self, PixoraError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| PixoraError::Config("email.api_key is not set".into()))?;
        let client = ResendClient::new(api_key, &config.base_url, &config.from)?;
        info!(from = %config.from, "email sender initialized");
        Ok(Self { client })
    }
}

#[async_trait]
impl PluginAdapter for ResendEmailSender {
    fn name(&self) -> &str {
        "resend"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Email
    }

    async fn health_check(&self) -> Result<HealthStatus, PixoraError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl EmailSender for ResendEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<String, PixoraError> {
        self.client.send(message).await
    }
}
