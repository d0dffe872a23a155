// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Forward path of a LoRA training: charge, register, start, record.
//!
//! Credits are charged before any external call. If a later step fails the
//! charge is refunded, and a training that already started but could not be
//! recorded is canceled, so no job runs without a row to reconcile into.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use pixora_config::PixoraConfig;
use pixora_core::types::{Hyperparameters, ModelSpec, NewModelRecord, TrainingRequest};
use pixora_core::{ObjectStorage, PixoraError, StorageAdapter, TrainingProvider, TrainingStatus};
use pixora_credits::{CreditLedger, CreditReason, Pricing};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::correlation::{Correlation, CorrelationSigner, build_callback_url};

/// Path of the training webhook route, appended to the public site URL.
pub const WEBHOOK_PATH: &str = "/api/webhooks/training";

/// Webhook events the provider is asked to deliver.
pub const WEBHOOK_EVENTS: [&str; 2] = ["start", "completed"];

/// Body of `POST /api/train`. Only `fileKey` and `modelName` are required.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingSubmission {
    #[serde(default)]
    pub file_key: String,
    #[serde(default)]
    pub model_name: String,
    pub trigger_word: Option<String>,
    pub autocaption: Option<bool>,
    pub autocaption_prefix: Option<String>,
    pub autocaption_suffix: Option<String>,
    pub steps: Option<u32>,
    pub lora_rank: Option<u32>,
    pub learning_rate: Option<f64>,
    pub batch_size: Option<u32>,
    pub resolution: Option<String>,
    pub caption_dropout_rate: Option<f64>,
    pub optimizer: Option<String>,
    pub cache_latents_to_disk: Option<bool>,
    pub layers_to_optimize_regex: Option<String>,
    pub gradient_checkpointing: Option<bool>,
}

impl TrainingSubmission {
    /// Requested hyperparameters with defaults filled in.
    pub fn hyperparameters(&self) -> Hyperparameters {
        let d = Hyperparameters::default();
        Hyperparameters {
            trigger_word: self.trigger_word.clone().unwrap_or(d.trigger_word),
            autocaption: self.autocaption.unwrap_or(d.autocaption),
            autocaption_prefix: self.autocaption_prefix.clone().unwrap_or(d.autocaption_prefix),
            autocaption_suffix: self.autocaption_suffix.clone().unwrap_or(d.autocaption_suffix),
            steps: self.steps.unwrap_or(d.steps),
            lora_rank: self.lora_rank.unwrap_or(d.lora_rank),
            learning_rate: self.learning_rate.unwrap_or(d.learning_rate),
            batch_size: self.batch_size.unwrap_or(d.batch_size),
            resolution: self.resolution.clone().unwrap_or(d.resolution),
            caption_dropout_rate: self.caption_dropout_rate.unwrap_or(d.caption_dropout_rate),
            optimizer: self.optimizer.clone().unwrap_or(d.optimizer),
            cache_latents_to_disk: self.cache_latents_to_disk.unwrap_or(d.cache_latents_to_disk),
            layers_to_optimize_regex: self
                .layers_to_optimize_regex
                .clone()
                .unwrap_or(d.layers_to_optimize_regex),
            gradient_checkpointing: self.gradient_checkpointing.unwrap_or(d.gradient_checkpointing),
        }
    }

    fn validate(&self) -> Result<(), PixoraError> {
        if self.file_key.trim().is_empty() || self.model_name.trim().is_empty() {
            return Err(PixoraError::Validation(
                "fileKey and modelName are required".into(),
            ));
        }
        Ok(())
    }
}

/// A started training as recorded locally.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedTraining {
    pub training_id: String,
    pub model_record_id: i64,
    pub model_id: String,
    pub credits: i64,
}

/// Static settings for submissions, taken from configuration.
#[derive(Debug, Clone)]
pub struct SubmitterSettings {
    /// Provider account owning destination models.
    pub model_owner: String,
    pub trainer_owner: String,
    pub trainer_model: String,
    pub trainer_version: String,
    pub hardware: String,
    pub bucket: String,
    pub signed_url_ttl: Duration,
    /// Absolute URL of the training webhook route.
    pub webhook_url: String,
}

impl SubmitterSettings {
    pub fn from_config(config: &PixoraConfig) -> Self {
        Self {
            model_owner: config.replicate.username.clone(),
            trainer_owner: config.replicate.trainer_owner.clone(),
            trainer_model: config.replicate.trainer_model.clone(),
            trainer_version: config.replicate.trainer_version.clone(),
            hardware: config.replicate.hardware.clone(),
            bucket: config.supabase.training_bucket.clone(),
            signed_url_ttl: Duration::from_secs(config.supabase.signed_url_ttl_secs),
            webhook_url: format!(
                "{}{WEBHOOK_PATH}",
                config.server.site_url.trim_end_matches('/')
            ),
        }
    }
}

/// Provider-side model name, `{owner}_{millis}_{slug}`.
pub fn derive_model_id(user_id: &str, epoch_millis: i64, model_name: &str) -> String {
    let slug = model_name.trim().to_lowercase().replace(' ', "-");
    format!("{user_id}_{epoch_millis}_{slug}")
}

/// Submits training jobs.
pub struct TrainingJobSubmitter {
    storage: Arc<dyn StorageAdapter>,
    object_storage: Arc<dyn ObjectStorage>,
    provider: Arc<dyn TrainingProvider>,
    ledger: CreditLedger,
    pricing: Pricing,
    signer: Option<CorrelationSigner>,
    settings: SubmitterSettings,
}

impl TrainingJobSubmitter {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        object_storage: Arc<dyn ObjectStorage>,
        provider: Arc<dyn TrainingProvider>,
        ledger: CreditLedger,
        pricing: Pricing,
        settings: SubmitterSettings,
    ) -> Self {
        Self {
            storage,
            object_storage,
            provider,
            ledger,
            pricing,
            signer: None,
            settings,
        }
    }

    /// Sign the correlation state in every callback URL.
    pub fn with_signer(mut self, signer: CorrelationSigner) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Charge, start and record a training for `user_id`.
    pub async fn submit(
        &self,
        user_id: &str,
        submission: &TrainingSubmission,
    ) -> Result<SubmittedTraining, PixoraError> {
        submission.validate()?;

        let cost = self.pricing.training_cost();
        let balance = self
            .ledger
            .decrement(user_id, cost, CreditReason::Training, None)
            .await?;

        match self.start(user_id, submission).await {
            Ok((training_id, model_record_id, model_id)) => {
                info!(
                    user_id,
                    model_name = %submission.model_name,
                    training_id = %training_id,
                    model_id = %model_id,
                    "training submitted"
                );
                Ok(SubmittedTraining {
                    training_id,
                    model_record_id,
                    model_id,
                    credits: balance,
                })
            }
            Err(e) => {
                warn!(user_id, model_name = %submission.model_name, error = %e, "training submission failed, refunding");
                if let Err(refund_err) = self
                    .ledger
                    .increment(user_id, cost, CreditReason::Refund, None)
                    .await
                {
                    warn!(user_id, amount = cost, error = %refund_err, "training refund failed");
                }
                Err(e)
            }
        }
    }

    async fn start(
        &self,
        user_id: &str,
        submission: &TrainingSubmission,
    ) -> Result<(String, i64, String), PixoraError> {
        let s = &self.settings;
        let bucket_prefix = format!("{}/", s.bucket);
        let file_path = submission
            .file_key
            .strip_prefix(&bucket_prefix)
            .unwrap_or(&submission.file_key)
            .to_string();

        let archive_url = self
            .object_storage
            .create_signed_url(&s.bucket, &file_path, s.signed_url_ttl.as_secs())
            .await?;

        let now = chrono::Utc::now();
        let model_id = derive_model_id(user_id, now.timestamp_millis(), &submission.model_name);
        self.provider
            .create_model(&ModelSpec {
                owner: s.model_owner.clone(),
                name: model_id.clone(),
                visibility: "private".into(),
                hardware: s.hardware.clone(),
            })
            .await?;

        let correlation = Correlation {
            user_id: user_id.to_string(),
            model_name: submission.model_name.clone(),
            file_path,
        };
        let webhook = build_callback_url(
            &s.webhook_url,
            &correlation,
            self.signer.as_ref(),
            now.timestamp(),
        )?;

        let hyperparameters = submission.hyperparameters();
        let job = self
            .provider
            .create_training(&TrainingRequest {
                trainer_owner: s.trainer_owner.clone(),
                trainer_model: s.trainer_model.clone(),
                trainer_version: s.trainer_version.clone(),
                destination: format!("{}/{model_id}", s.model_owner),
                input: trainer_input(&hyperparameters, &archive_url),
                webhook,
                webhook_events_filter: WEBHOOK_EVENTS.iter().map(|e| e.to_string()).collect(),
            })
            .await?;

        let training_status = TrainingStatus::from_str(&job.status).unwrap_or_else(|_| {
            warn!(status = %job.status, training_id = %job.id, "unexpected initial training status");
            TrainingStatus::Starting
        });

        let record = NewModelRecord {
            user_id: user_id.to_string(),
            model_id: model_id.clone(),
            model_name: submission.model_name.clone(),
            hyperparameters,
            training_id: job.id.clone(),
            training_status,
        };
        match self.storage.insert_model(&record).await {
            Ok(id) => Ok((job.id, id, model_id)),
            Err(e) => {
                if let Err(cancel_err) = self.provider.cancel_training(&job.id).await {
                    warn!(training_id = %job.id, error = %cancel_err, "failed to cancel unrecorded training");
                }
                Err(e)
            }
        }
    }
}

fn trainer_input(hp: &Hyperparameters, archive_url: &str) -> serde_json::Value {
    json!({
        "input_images": archive_url,
        "trigger_word": hp.trigger_word,
        "autocaption": hp.autocaption,
        "autocaption_prefix": hp.autocaption_prefix,
        "autocaption_suffix": hp.autocaption_suffix,
        "steps": hp.steps,
        "lora_rank": hp.lora_rank,
        "learning_rate": hp.learning_rate,
        "batch_size": hp.batch_size,
        "resolution": hp.resolution,
        "caption_dropout_rate": hp.caption_dropout_rate,
        "optimizer": hp.optimizer,
        "cache_latents_to_disk": hp.cache_latents_to_disk,
        "layers_to_optimize_regex": hp.layers_to_optimize_regex,
        "gradient_checkpointing": hp.gradient_checkpointing,
    })
}
