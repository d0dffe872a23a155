// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Replicate adapter for Pixora.
//!
//! One client serves both collaborators Replicate plays: the LoRA
//! [`TrainingProvider`] and the [`ImageGenerator`].

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use pixora_config::model::ReplicateConfig;
use pixora_core::types::{AdapterType, HealthStatus, ModelSpec, TrainingJob, TrainingRequest};
use pixora_core::{ImageGenerator, PixoraError, PluginAdapter, TrainingProvider};
use tracing::{debug, info};

use crate::client::ReplicateClient;
use crate::types::CreateTrainingRequest;

pub struct ReplicateProvider {
    client: ReplicateClient,
}

impl ReplicateProvider {
    /// Builds the adapter from `[replicate]`. Fails when no API token is configured.
    pub fn new(config: &ReplicateConfig) -> Result<Self, PixoraError> {
        let token = config
            .api_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| PixoraError::Config("replicate.api_token is not set".into()))?;
        let client = ReplicateClient::new(
            token,
            &config.base_url,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        info!(base_url = %config.base_url, "Replicate provider initialized");
        Ok(Self { client })
    }

    /// Wraps an existing client.
    pub fn with_client(client: ReplicateClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PluginAdapter for ReplicateProvider {
    fn name(&self) -> &str {
        "replicate"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::TrainingProvider
    }

    async fn health_check(&self) -> Result<HealthStatus, PixoraError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl TrainingProvider for ReplicateProvider {
    async fn create_model(&self, spec: &ModelSpec) -> Result<(), PixoraError> {
        self.client
            .create_model(&spec.owner, &spec.name, &spec.visibility, &spec.hardware)
            .await?;
        debug!(owner = %spec.owner, name = %spec.name, "destination model created");
        Ok(())
    }

    async fn create_training(&self, request: &TrainingRequest) -> Result<TrainingJob, PixoraError> {
        let body = CreateTrainingRequest {
            destination: &request.destination,
            input: &request.input,
            webhook: &request.webhook,
            webhook_events_filter: &request.webhook_events_filter,
        };
        let response = self
            .client
            .create_training(
                &request.trainer_owner,
                &request.trainer_model,
                &request.trainer_version,
                &body,
            )
            .await?;
        Ok(TrainingJob {
            id: response.id,
            status: response.status,
        })
    }

    async fn cancel_training(&self, training_id: &str) -> Result<(), PixoraError> {
        self.client.cancel_training(training_id).await
    }
}

#[async_trait]
impl ImageGenerator for ReplicateProvider {
    async fn run(
        &self,
        model: &str,
        input: &serde_json::Value,
    ) -> Result<Vec<String>, PixoraError> {
        let prediction = self.client.predict(model, input).await?;
        Ok(prediction.image_urls())
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, PixoraError> {
        self.client.download(url).await
    }
}
