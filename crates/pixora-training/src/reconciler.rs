// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Applies verified training webhooks to model records.
//!
//! The record is found by `(owner, model name)` from the callback URL, never
//! by the provider's training id. Each accepted transition is persisted with
//! a compare-and-set, then its side effects run one by one. A failing email,
//! archive removal or counter update is logged and does not affect the
//! others or the acknowledgment.

use std::sync::Arc;

use pixora_core::types::{ModelRecord, StatusUpdate, UserProfile};
use pixora_core::{EmailSender, ObjectStorage, PixoraError, StorageAdapter, TrainingStatus};
use pixora_email::templates::{TrainingNotice, training_status_email};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::correlation::Correlation;
use crate::status::{StatusEvent, Transition, allowed_predecessors, transition};

/// The subset of the provider's training payload the reconciler reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrainingEvent {
    #[serde(default)]
    pub id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub metrics: Option<TrainingMetrics>,
    #[serde(default)]
    pub output: Option<TrainingOutput>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrainingMetrics {
    #[serde(default)]
    pub predict_time: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrainingOutput {
    /// `owner/name:hash`
    #[serde(default)]
    pub version: Option<String>,
}

impl TrainingEvent {
    /// Hash part of `output.version`.
    pub fn model_version(&self) -> Option<String> {
        let composite = self.output.as_ref()?.version.as_deref()?;
        composite.split(':').nth(1).map(str::to_string)
    }
}

/// Why an event was acknowledged without touching any record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    Starting,
    UnknownStatus(String),
    UnknownModel,
}

/// Result of reconciling one webhook. All variants are acknowledged with 200.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Applied(TrainingStatus),
    Duplicate(TrainingStatus),
    Stale {
        current: TrainingStatus,
        received: TrainingStatus,
    },
    Ignored(IgnoreReason),
}

/// Drives model records through the training lifecycle.
pub struct TrainingStatusMachine {
    storage: Arc<dyn StorageAdapter>,
    object_storage: Arc<dyn ObjectStorage>,
    email: Option<Arc<dyn EmailSender>>,
    bucket: String,
    site_url: String,
}

impl TrainingStatusMachine {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        object_storage: Arc<dyn ObjectStorage>,
        email: Option<Arc<dyn EmailSender>>,
        bucket: impl Into<String>,
        site_url: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            object_storage,
            email,
            bucket: bucket.into(),
            site_url: site_url.into(),
        }
    }

    /// Reconcile one verified event.
    ///
    /// Fails with `Unauthenticated` when the correlated owner has no profile;
    /// nothing is touched in that case.
    pub async fn handle(
        &self,
        correlation: &Correlation,
        event: &TrainingEvent,
    ) -> Result<ReconcileOutcome, PixoraError> {
        let profile = self.resolve_owner(&correlation.user_id).await?;

        let next = match StatusEvent::parse(&event.status) {
            StatusEvent::Actionable(status) => status,
            StatusEvent::Starting => {
                debug!(model_name = %correlation.model_name, "training starting, nothing to apply");
                return Ok(ReconcileOutcome::Ignored(IgnoreReason::Starting));
            }
            StatusEvent::Unknown(raw) => {
                warn!(status = %raw, model_name = %correlation.model_name, "ignoring unknown training status");
                return Ok(ReconcileOutcome::Ignored(IgnoreReason::UnknownStatus(raw)));
            }
        };

        let Some(record) = self
            .storage
            .find_model(&profile.id, &correlation.model_name)
            .await?
        else {
            warn!(
                user_id = %profile.id,
                model_name = %correlation.model_name,
                status = %next,
                "no model record for training webhook"
            );
            return Ok(ReconcileOutcome::Ignored(IgnoreReason::UnknownModel));
        };

        match transition(record.training_status, next) {
            Transition::Advance => self.advance(&profile, correlation, &record, next, event).await,
            Transition::Duplicate => Ok(self.duplicate(correlation, &record, next).await),
            Transition::Stale => Ok(stale(&record, next)),
        }
    }

    async fn resolve_owner(&self, user_id: &str) -> Result<UserProfile, PixoraError> {
        if user_id.is_empty() {
            return Err(PixoraError::Unauthenticated("webhook carries no user id".into()));
        }
        self.storage
            .get_profile(user_id)
            .await?
            .ok_or_else(|| PixoraError::Unauthenticated(format!("unknown user {user_id}")))
    }

    async fn advance(
        &self,
        profile: &UserProfile,
        correlation: &Correlation,
        record: &ModelRecord,
        next: TrainingStatus,
        event: &TrainingEvent,
    ) -> Result<ReconcileOutcome, PixoraError> {
        let update = status_update(next, event);
        let applied = self
            .storage
            .transition_model_status(record.id, allowed_predecessors(next), &update)
            .await?;

        if !applied {
            // Lost a race with a concurrent delivery; classify against the winner.
            let current = self
                .storage
                .get_model(record.id)
                .await?
                .map_or(record.training_status, |r| r.training_status);
            return Ok(match transition(current, next) {
                Transition::Duplicate => self.duplicate(correlation, record, next).await,
                _ => ReconcileOutcome::Stale {
                    current,
                    received: next,
                },
            });
        }

        info!(
            user_id = %record.user_id,
            model_name = %record.model_name,
            training_id = %record.training_id,
            from = %record.training_status,
            status = %next,
            "training status updated"
        );

        self.notify(profile, &record.model_name, next).await;
        if next.is_terminal() {
            self.remove_archive(&correlation.file_path).await;
        }
        if next == TrainingStatus::Succeeded
            && let Err(e) = self.storage.increment_models_trained(&record.user_id).await
        {
            warn!(user_id = %record.user_id, error = %e, "failed to bump models_trained");
        }

        Ok(ReconcileOutcome::Applied(next))
    }

    /// A redelivered status: re-run archive cleanup for terminal states, no email.
    async fn duplicate(
        &self,
        correlation: &Correlation,
        record: &ModelRecord,
        status: TrainingStatus,
    ) -> ReconcileOutcome {
        debug!(model_name = %record.model_name, status = %status, "duplicate training webhook");
        if status.is_terminal() {
            self.remove_archive(&correlation.file_path).await;
        }
        ReconcileOutcome::Duplicate(status)
    }

    async fn notify(&self, profile: &UserProfile, model_name: &str, status: TrainingStatus) {
        let Some(email) = &self.email else {
            return;
        };
        if profile.email.is_empty() {
            debug!(user_id = %profile.id, "profile has no email address");
            return;
        }
        let notice = TrainingNotice {
            to: &profile.email,
            display_name: profile.display_name.as_deref(),
            model_name,
            status,
            site_url: &self.site_url,
        };
        let Some(message) = training_status_email(&notice) else {
            return;
        };
        match email.send(&message).await {
            Ok(id) => debug!(user_id = %profile.id, email_id = %id, status = %status, "training email sent"),
            Err(e) => warn!(user_id = %profile.id, status = %status, error = %e, "failed to send training email"),
        }
    }

    async fn remove_archive(&self, file_path: &str) {
        if file_path.is_empty() {
            debug!("no training archive path to clean up");
            return;
        }
        match self
            .object_storage
            .remove(&self.bucket, &[file_path.to_string()])
            .await
        {
            Ok(()) => debug!(bucket = %self.bucket, file_path, "training archive removed"),
            Err(e) => warn!(bucket = %self.bucket, file_path, error = %e, "failed to remove training archive"),
        }
    }
}

fn status_update(next: TrainingStatus, event: &TrainingEvent) -> StatusUpdate {
    if next != TrainingStatus::Succeeded {
        return StatusUpdate::status_only(next);
    }
    let model_version = event.model_version();
    if model_version.is_none() {
        warn!(training_id = ?event.id, "succeeded event carries no parsable output version");
    }
    StatusUpdate {
        status: next,
        training_time: event.metrics.as_ref().and_then(|m| m.predict_time),
        model_version,
    }
}

fn stale(record: &ModelRecord, received: TrainingStatus) -> ReconcileOutcome {
    info!(
        model_name = %record.model_name,
        current = %record.training_status,
        received = %received,
        "ignoring out-of-order training webhook"
    );
    ReconcileOutcome::Stale {
        current: record.training_status,
        received,
    }
}
