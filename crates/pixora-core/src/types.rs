// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across adapter traits and services.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of external collaborator an adapter talks to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Identity,
    ObjectStorage,
    TrainingProvider,
    ImageGenerator,
    Email,
    Payment,
}

/// Lifecycle status of a training job as stored on its model record.
///
/// Persisted upper-case (`PROCESSING`); parsed case-insensitively so the
/// provider's lower-case webhook statuses map onto the same variants.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrainingStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

impl TrainingStatus {
    /// Terminal states accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }
}

/// An authenticated user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
}

/// Per-user account row holding the credit balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    /// Never negative; enforced by the ledger and a CHECK constraint.
    pub credits: i64,
    pub models_trained: i64,
    pub images_generated: i64,
    pub created_at: String,
}

/// LoRA trainer hyperparameters, passed through to the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    pub trigger_word: String,
    pub autocaption: bool,
    pub autocaption_prefix: String,
    pub autocaption_suffix: String,
    pub steps: u32,
    pub lora_rank: u32,
    pub learning_rate: f64,
    pub batch_size: u32,
    pub resolution: String,
    pub caption_dropout_rate: f64,
    pub optimizer: String,
    pub cache_latents_to_disk: bool,
    pub layers_to_optimize_regex: String,
    pub gradient_checkpointing: bool,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            trigger_word: "TOK".to_string(),
            autocaption: true,
            autocaption_prefix: String::new(),
            autocaption_suffix: String::new(),
            steps: 1000,
            lora_rank: 16,
            learning_rate: 0.0004,
            batch_size: 1,
            resolution: "512,768,1024".to_string(),
            caption_dropout_rate: 0.05,
            optimizer: "adamw8bit".to_string(),
            cache_latents_to_disk: false,
            layers_to_optimize_regex: String::new(),
            gradient_checkpointing: false,
        }
    }
}

/// A model record about to be inserted at submission time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewModelRecord {
    pub user_id: String,
    /// Provider-side model name, `{owner}_{millis}_{slug}`.
    pub model_id: String,
    pub model_name: String,
    pub hyperparameters: Hyperparameters,
    pub training_id: String,
    pub training_status: TrainingStatus,
}

/// One row per training attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub id: i64,
    pub user_id: String,
    pub model_id: String,
    pub model_name: String,
    pub hyperparameters: Hyperparameters,
    pub training_id: String,
    pub training_status: TrainingStatus,
    /// Seconds reported by the provider, set only on success.
    pub training_time: Option<f64>,
    /// Output version hash, set only on success.
    pub model_version: Option<String>,
    pub created_at: String,
}

/// Fields written by a status transition.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub status: TrainingStatus,
    pub training_time: Option<f64>,
    pub model_version: Option<String>,
}

impl StatusUpdate {
    /// An update that only changes the status column.
    pub fn status_only(status: TrainingStatus) -> Self {
        Self {
            status,
            training_time: None,
            model_version: None,
        }
    }
}

/// Metadata row for a generated image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub id: i64,
    pub user_id: String,
    pub model_name: String,
    /// Storage key or provider URL of the image.
    pub image_name: String,
    pub prompt: String,
    pub output_format: Option<String>,
    pub aspect_ratio: Option<String>,
    pub num_inference_steps: Option<i64>,
    pub guidance: Option<f64>,
    pub created_at: String,
}

/// A generated image about to be recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewGeneratedImage {
    pub user_id: String,
    pub model_name: String,
    pub image_name: String,
    pub prompt: String,
    pub output_format: Option<String>,
    pub aspect_ratio: Option<String>,
    pub num_inference_steps: Option<i64>,
    pub guidance: Option<f64>,
}

/// A payment order awaiting capture, remembered so capture knows the pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOrder {
    pub order_id: String,
    pub user_id: String,
    pub pack_id: String,
    pub status: String,
    pub created_at: String,
}

// --- Provider request/response types ---

/// Destination model registered with the training provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub owner: String,
    pub name: String,
    pub visibility: String,
    pub hardware: String,
}

/// A training job request against a base trainer version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRequest {
    pub trainer_owner: String,
    pub trainer_model: String,
    pub trainer_version: String,
    /// `{owner}/{name}` of the destination model.
    pub destination: String,
    /// Provider-specific input object.
    pub input: serde_json::Value,
    pub webhook: String,
    pub webhook_events_filter: Vec<String>,
}

/// A training job as acknowledged by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingJob {
    pub id: String,
    /// Provider status string, usually lower-case (`starting`).
    pub status: String,
}

/// An email ready to hand to the email provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

/// A payment order as reported by the payment provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentOrder {
    pub id: String,
    pub status: String,
    /// Full provider response, forwarded to the browser SDK.
    pub raw: serde_json::Value,
}
