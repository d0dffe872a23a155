// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LoRA training and image generation workflows.
//!
//! - **Submitter**: charges credits and starts a training with a correlated callback URL
//! - **Verifier**: authenticates provider webhooks (HMAC-SHA256, timestamp tolerance)
//! - **Correlation**: builds and parses the callback URL's query parameters
//! - **Status**: the forward-only training status transition table
//! - **Reconciler**: applies verified webhooks to model records
//! - **Generate**: paid image generation
//! - **Gallery**: signed listing and deletion of stored images

pub mod correlation;
pub mod gallery;
pub mod generate;
pub mod reconciler;
pub mod status;
pub mod submitter;
pub mod verifier;

pub use correlation::{CallbackParams, Correlation, CorrelationSigner, build_callback_url, extract};
pub use gallery::{GalleryImage, ImageGallery};
pub use generate::{GenerationRequest, GenerationResult, ImageGenerationService};
pub use reconciler::{IgnoreReason, ReconcileOutcome, TrainingEvent, TrainingStatusMachine};
pub use status::{StatusEvent, Transition, transition};
pub use submitter::{
    SubmittedTraining, SubmitterSettings, TrainingJobSubmitter, TrainingSubmission, WEBHOOK_PATH,
};
pub use verifier::{WebhookHeaders, WebhookVerifier};
