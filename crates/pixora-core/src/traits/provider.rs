// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model provider traits: LoRA training and image generation.

use async_trait::async_trait;

use crate::error::PixoraError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ModelSpec, TrainingJob, TrainingRequest};

/// Adapter for the model-training provider.
#[async_trait]
pub trait TrainingProvider: PluginAdapter {
    /// Registers the destination model that will receive the trained version.
    async fn create_model(&self, spec: &ModelSpec) -> Result<(), PixoraError>;

    /// Starts a training job; status updates arrive later on `request.webhook`.
    async fn create_training(&self, request: &TrainingRequest)
    -> Result<TrainingJob, PixoraError>;

    /// Cancels a running training job.
    async fn cancel_training(&self, training_id: &str) -> Result<(), PixoraError>;
}

/// Adapter for the image-generation provider.
#[async_trait]
pub trait ImageGenerator: PluginAdapter {
    /// Runs `model` with a pass-through `input` and returns the output image URLs.
    async fn run(
        &self,
        model: &str,
        input: &serde_json::Value,
    ) -> Result<Vec<String>, PixoraError>;

    /// Fetches the bytes behind an output URL returned by [`ImageGenerator::run`].
    async fn download(&self, url: &str) -> Result<Vec<u8>, PixoraError>;
}
