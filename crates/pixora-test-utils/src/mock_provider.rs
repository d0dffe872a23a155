// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock model provider: training jobs and image generation.
//!
//! Records every call for assertions. Individual operations can be made to
//! fail to exercise compensation paths.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use pixora_core::types::{AdapterType, HealthStatus, ModelSpec, TrainingJob, TrainingRequest};
use pixora_core::{ImageGenerator, PixoraError, PluginAdapter, TrainingProvider};

/// A mock training provider and image generator.
pub struct MockModelProvider {
    models: Arc<Mutex<Vec<ModelSpec>>>,
    trainings: Arc<Mutex<Vec<TrainingRequest>>>,
    canceled: Arc<Mutex<Vec<String>>>,
    runs: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
    counter: AtomicUsize,
    fail_create_model: AtomicBool,
    fail_create_training: AtomicBool,
    fail_run: AtomicBool,
    fail_download: AtomicBool,
}

impl MockModelProvider {
    pub fn new() -> Self {
        Self {
            models: Arc::new(Mutex::new(Vec::new())),
            trainings: Arc::new(Mutex::new(Vec::new())),
            canceled: Arc::new(Mutex::new(Vec::new())),
            runs: Arc::new(Mutex::new(Vec::new())),
            counter: AtomicUsize::new(0),
            fail_create_model: AtomicBool::new(false),
            fail_create_training: AtomicBool::new(false),
            fail_run: AtomicBool::new(false),
            fail_download: AtomicBool::new(false),
        }
    }

    pub fn fail_create_model(&self, fail: bool) {
        self.fail_create_model.store(fail, Ordering::SeqCst);
    }

    pub fn fail_create_training(&self, fail: bool) {
        self.fail_create_training.store(fail, Ordering::SeqCst);
    }

    pub fn fail_run(&self, fail: bool) {
        self.fail_run.store(fail, Ordering::SeqCst);
    }

    pub fn fail_download(&self, fail: bool) {
        self.fail_download.store(fail, Ordering::SeqCst);
    }

    pub async fn created_models(&self) -> Vec<ModelSpec> {
        self.models.lock().await.clone()
    }

    pub async fn trainings(&self) -> Vec<TrainingRequest> {
        self.trainings.lock().await.clone()
    }

    pub async fn canceled(&self) -> Vec<String> {
        self.canceled.lock().await.clone()
    }

    pub async fn runs(&self) -> Vec<(String, serde_json::Value)> {
        self.runs.lock().await.clone()
    }

    /// Total number of calls that reached the provider.
    pub async fn call_count(&self) -> usize {
        self.models.lock().await.len()
            + self.trainings.lock().await.len()
            + self.canceled.lock().await.len()
            + self.runs.lock().await.len()
    }
}

impl Default for MockModelProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockModelProvider {
    fn name(&self) -> &str {
        "mock-model-provider"
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
impl TrainingProvider for MockModelProvider {
    async fn create_model(&self, spec: &ModelSpec) -> Result<(), PixoraError> {
        if self.fail_create_model.load(Ordering::SeqCst) {
            return Err(PixoraError::provider("mock: create_model failed"));
        }
        self.models.lock().await.push(spec.clone());
        Ok(())
    }

    async fn create_training(&self, request: &TrainingRequest) -> Result<TrainingJob, PixoraError> {
        if self.fail_create_training.load(Ordering::SeqCst) {
            return Err(PixoraError::provider("mock: create_training failed"));
        }
        self.trainings.lock().await.push(request.clone());
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(TrainingJob {
            id: format!("train-{n}"),
            status: "starting".to_string(),
        })
    }

    async fn cancel_training(&self, training_id: &str) -> Result<(), PixoraError> {
        self.canceled.lock().await.push(training_id.to_string());
        Ok(())
    }
}

#[async_trait]
impl ImageGenerator for MockModelProvider {
    async fn run(
        &self,
        model: &str,
        input: &serde_json::Value,
    ) -> Result<Vec<String>, PixoraError> {
        if self.fail_run.load(Ordering::SeqCst) {
            return Err(PixoraError::provider("mock: prediction failed"));
        }
        self.runs.lock().await.push((model.to_string(), input.clone()));
        let count = input
            .get("num_outputs")
            .and_then(|v| v.as_u64())
            .unwrap_or(1);
        Ok((1..=count)
            .map(|i| format!("https://images.test/{}/{i}.webp", model.replace('/', "_")))
            .collect())
    }

    /// Returns the URL itself as the image bytes.
    async fn download(&self, url: &str) -> Result<Vec<u8>, PixoraError> {
        if self.fail_download.load(Ordering::SeqCst) {
            return Err(PixoraError::provider("mock: output expired"));
        }
        Ok(url.as_bytes().to_vec())
    }
}
