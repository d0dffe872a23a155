// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook reconciliation: lifecycle, redelivery, reordering and partial failure.

use std::sync::Arc;

use async_trait::async_trait;
use pixora_core::types::{
    AdapterType, AuthUser, GeneratedImage, ModelRecord, NewGeneratedImage, NewModelRecord,
    PendingOrder, StatusUpdate, UserProfile,
};
use pixora_core::{
    EmailSender, HealthStatus, PixoraError, PluginAdapter, StorageAdapter, TrainingStatus,
};
use pixora_test_utils::TestHarness;
use pixora_training::correlation::extract_from_url;
use pixora_training::{
    Correlation, IgnoreReason, ReconcileOutcome, SubmitterSettings, TrainingEvent,
    TrainingJobSubmitter, TrainingStatusMachine, TrainingSubmission,
};

struct Fixture {
    h: TestHarness,
    machine: TrainingStatusMachine,
    correlation: Correlation,
}

async fn submitted() -> Fixture {
    let h = TestHarness::builder().build().await.unwrap();
    h.add_user("tok", "u1", 1000).await.unwrap();

    let submitter = TrainingJobSubmitter::new(
        h.storage_adapter(),
        h.objects.clone(),
        h.models.clone(),
        h.ledger.clone(),
        h.pricing.clone(),
        SubmitterSettings::from_config(&h.config),
    );
    let submission = TrainingSubmission {
        file_key: "TrainingData/u1/cats.zip".into(),
        model_name: "My Cats".into(),
        ..TrainingSubmission::default()
    };
    submitter.submit("u1", &submission).await.unwrap();

    let webhook = h.models.trainings().await[0].webhook.clone();
    let correlation = extract_from_url(&webhook).unwrap().correlation;

    let machine = TrainingStatusMachine::new(
        h.storage_adapter(),
        h.objects.clone(),
        Some(h.email.clone() as Arc<dyn EmailSender>),
        h.config.supabase.training_bucket.clone(),
        h.config.server.site_url.clone(),
    );
    Fixture {
        h,
        machine,
        correlation,
    }
}

fn event(json: serde_json::Value) -> TrainingEvent {
    serde_json::from_value(json).unwrap()
}

fn succeeded() -> TrainingEvent {
    event(serde_json::json!({
        "id": "train-1",
        "status": "succeeded",
        "metrics": {"predict_time": 845.2},
        "output": {"version": "owner/model:abcd1234"}
    }))
}

fn processing() -> TrainingEvent {
    event(serde_json::json!({"id": "train-1", "status": "processing"}))
}

#[tokio::test]
async fn full_lifecycle_updates_record_and_cleans_up() {
    let f = submitted().await;

    let outcome = f.machine.handle(&f.correlation, &processing()).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Applied(TrainingStatus::Processing));
    let record = f.h.model("u1", "My Cats").await.unwrap().unwrap();
    assert_eq!(record.training_status, TrainingStatus::Processing);
    assert_eq!(f.h.email.sent_count().await, 1);
    assert!(f.h.objects.removed().await.is_empty());

    let outcome = f.machine.handle(&f.correlation, &succeeded()).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Applied(TrainingStatus::Succeeded));
    let record = f.h.model("u1", "My Cats").await.unwrap().unwrap();
    assert_eq!(record.training_status, TrainingStatus::Succeeded);
    assert_eq!(record.training_time, Some(845.2));
    assert_eq!(record.model_version.as_deref(), Some("abcd1234"));

    assert_eq!(f.h.email.sent_count().await, 2);
    assert_eq!(
        f.h.objects.removed().await,
        vec![("TrainingData".to_string(), "u1/cats.zip".to_string())]
    );
    let profile = f.h.storage.get_profile("u1").await.unwrap().unwrap();
    assert_eq!(profile.models_trained, 1);
    // Credits were charged once at submission and never touched again.
    assert_eq!(profile.credits, 360);
}

#[tokio::test]
async fn redelivered_terminal_event_is_idempotent() {
    let f = submitted().await;
    f.machine.handle(&f.correlation, &succeeded()).await.unwrap();
    let first = f.h.model("u1", "My Cats").await.unwrap().unwrap();
    let emails = f.h.email.sent_count().await;

    let outcome = f.machine.handle(&f.correlation, &succeeded()).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Duplicate(TrainingStatus::Succeeded));
    assert_eq!(f.h.model("u1", "My Cats").await.unwrap().unwrap(), first);
    assert_eq!(f.h.email.sent_count().await, emails, "no second email");
    assert_eq!(f.h.objects.removed().await.len(), 2, "cleanup re-run");

    let profile = f.h.storage.get_profile("u1").await.unwrap().unwrap();
    assert_eq!(profile.models_trained, 1);
}

#[tokio::test]
async fn late_processing_does_not_regress_succeeded() {
    let f = submitted().await;
    f.machine.handle(&f.correlation, &succeeded()).await.unwrap();

    let outcome = f.machine.handle(&f.correlation, &processing()).await.unwrap();
    assert_eq!(
        outcome,
        ReconcileOutcome::Stale {
            current: TrainingStatus::Succeeded,
            received: TrainingStatus::Processing
        }
    );
    let record = f.h.model("u1", "My Cats").await.unwrap().unwrap();
    assert_eq!(record.training_status, TrainingStatus::Succeeded);
    assert_eq!(record.model_version.as_deref(), Some("abcd1234"));
}

#[tokio::test]
async fn different_terminal_after_terminal_is_stale() {
    let f = submitted().await;
    let failed = event(serde_json::json!({"status": "failed", "error": "OOM"}));
    assert_eq!(
        f.machine.handle(&f.correlation, &failed).await.unwrap(),
        ReconcileOutcome::Applied(TrainingStatus::Failed)
    );
    let outcome = f.machine.handle(&f.correlation, &succeeded()).await.unwrap();
    assert!(matches!(outcome, ReconcileOutcome::Stale { .. }));

    let record = f.h.model("u1", "My Cats").await.unwrap().unwrap();
    assert_eq!(record.training_status, TrainingStatus::Failed);
    assert_eq!(record.model_version, None);
    let profile = f.h.storage.get_profile("u1").await.unwrap().unwrap();
    assert_eq!(profile.models_trained, 0);
    assert_eq!(f.h.objects.removed().await.len(), 1);
}

#[tokio::test]
async fn canceled_cleans_up_archive() {
    let f = submitted().await;
    let canceled = event(serde_json::json!({"status": "canceled"}));
    f.machine.handle(&f.correlation, &canceled).await.unwrap();

    let record = f.h.model("u1", "My Cats").await.unwrap().unwrap();
    assert_eq!(record.training_status, TrainingStatus::Canceled);
    assert_eq!(f.h.objects.removed().await.len(), 1);
    let sent = f.h.email.sent().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].subject.contains("canceled"));
}

#[tokio::test]
async fn side_effect_failures_do_not_fail_the_event() {
    let f = submitted().await;
    f.h.email.fail(true);
    f.h.objects.fail_remove(true);

    let outcome = f.machine.handle(&f.correlation, &succeeded()).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Applied(TrainingStatus::Succeeded));
    let record = f.h.model("u1", "My Cats").await.unwrap().unwrap();
    assert_eq!(record.training_status, TrainingStatus::Succeeded);
    let profile = f.h.storage.get_profile("u1").await.unwrap().unwrap();
    assert_eq!(profile.models_trained, 1);
}

#[tokio::test]
async fn unknown_owner_is_unauthenticated_and_touches_nothing() {
    let f = submitted().await;
    let stranger = Correlation {
        user_id: "nobody".into(),
        ..f.correlation.clone()
    };
    let err = f.machine.handle(&stranger, &succeeded()).await.unwrap_err();
    assert!(matches!(err, PixoraError::Unauthenticated(_)));

    let empty = Correlation::default();
    let err = f.machine.handle(&empty, &succeeded()).await.unwrap_err();
    assert!(matches!(err, PixoraError::Unauthenticated(_)));

    let record = f.h.model("u1", "My Cats").await.unwrap().unwrap();
    assert_eq!(record.training_status, TrainingStatus::Starting);
    assert_eq!(f.h.email.sent_count().await, 0);
    assert!(f.h.objects.removed().await.is_empty());
}

#[tokio::test]
async fn unknown_model_and_status_are_ignored() {
    let f = submitted().await;

    let other_model = Correlation {
        model_name: "Dogs".into(),
        ..f.correlation.clone()
    };
    assert_eq!(
        f.machine.handle(&other_model, &succeeded()).await.unwrap(),
        ReconcileOutcome::Ignored(IgnoreReason::UnknownModel)
    );

    let queued = event(serde_json::json!({"status": "queued"}));
    assert_eq!(
        f.machine.handle(&f.correlation, &queued).await.unwrap(),
        ReconcileOutcome::Ignored(IgnoreReason::UnknownStatus("queued".into()))
    );

    let starting = event(serde_json::json!({"status": "starting"}));
    assert_eq!(
        f.machine.handle(&f.correlation, &starting).await.unwrap(),
        ReconcileOutcome::Ignored(IgnoreReason::Starting)
    );

    let record = f.h.model("u1", "My Cats").await.unwrap().unwrap();
    assert_eq!(record.training_status, TrainingStatus::Starting);
    assert_eq!(f.h.email.sent_count().await, 0);
}

#[tokio::test]
async fn newest_record_wins_for_reused_model_name() {
    let f = submitted().await;
    f.machine.handle(&f.correlation, &succeeded()).await.unwrap();

    // A second training under the same display name.
    let storage: Arc<dyn StorageAdapter> = f.h.storage_adapter();
    let submitter = TrainingJobSubmitter::new(
        storage,
        f.h.objects.clone(),
        f.h.models.clone(),
        f.h.ledger.clone(),
        f.h.pricing.clone(),
        SubmitterSettings::from_config(&f.h.config),
    );
    f.h.ledger
        .increment("u1", 640, pixora_credits::CreditReason::Grant, None)
        .await
        .unwrap();
    let second = submitter
        .submit(
            "u1",
            &TrainingSubmission {
                file_key: "TrainingData/u1/cats-2.zip".into(),
                model_name: "My Cats".into(),
                ..TrainingSubmission::default()
            },
        )
        .await
        .unwrap();

    let outcome = f.machine.handle(&f.correlation, &processing()).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Applied(TrainingStatus::Processing));
    let latest = f.h.model("u1", "My Cats").await.unwrap().unwrap();
    assert_eq!(latest.id, second.model_record_id);
    assert_eq!(latest.training_status, TrainingStatus::Processing);
}

/// Storage where another delivery always wins the status update first, and
/// a new training under the same display name lands right after it.
struct RacedStorage {
    inner: Arc<dyn StorageAdapter>,
}

#[async_trait]
impl PluginAdapter for RacedStorage {
    fn name(&self) -> &str {
        "raced"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, PixoraError> {
        self.inner.health_check().await
    }
}

#[async_trait]
impl StorageAdapter for RacedStorage {
    async fn initialize(&self) -> Result<(), PixoraError> {
        self.inner.initialize().await
    }

    async fn close(&self) -> Result<(), PixoraError> {
        self.inner.close().await
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, PixoraError> {
        self.inner.get_profile(user_id).await
    }

    async fn ensure_profile(
        &self,
        user: &AuthUser,
        initial_credits: i64,
    ) -> Result<UserProfile, PixoraError> {
        self.inner.ensure_profile(user, initial_credits).await
    }

    async fn update_display_name(
        &self,
        user_id: &str,
        display_name: &str,
    ) -> Result<Option<UserProfile>, PixoraError> {
        self.inner.update_display_name(user_id, display_name).await
    }

    async fn increment_models_trained(&self, user_id: &str) -> Result<(), PixoraError> {
        self.inner.increment_models_trained(user_id).await
    }

    async fn increment_images_generated(
        &self,
        user_id: &str,
        count: i64,
    ) -> Result<(), PixoraError> {
        self.inner.increment_images_generated(user_id, count).await
    }

    async fn insert_model(&self, record: &NewModelRecord) -> Result<i64, PixoraError> {
        self.inner.insert_model(record).await
    }

    async fn get_model(&self, id: i64) -> Result<Option<ModelRecord>, PixoraError> {
        self.inner.get_model(id).await
    }

    async fn find_model(
        &self,
        user_id: &str,
        model_name: &str,
    ) -> Result<Option<ModelRecord>, PixoraError> {
        self.inner.find_model(user_id, model_name).await
    }

    async fn list_models(&self, user_id: &str) -> Result<Vec<ModelRecord>, PixoraError> {
        self.inner.list_models(user_id).await
    }

    async fn delete_model(&self, user_id: &str, id: i64) -> Result<bool, PixoraError> {
        self.inner.delete_model(user_id, id).await
    }

    async fn transition_model_status(
        &self,
        id: i64,
        from: &[TrainingStatus],
        update: &StatusUpdate,
    ) -> Result<bool, PixoraError> {
        assert!(self.inner.transition_model_status(id, from, update).await?);
        let winner = self.inner.get_model(id).await?.unwrap();
        self.inner
            .insert_model(&NewModelRecord {
                user_id: winner.user_id.clone(),
                model_id: format!("{}_retrain", winner.model_id),
                model_name: winner.model_name.clone(),
                hyperparameters: winner.hyperparameters.clone(),
                training_id: "train-2".into(),
                training_status: TrainingStatus::Starting,
            })
            .await?;
        Ok(false)
    }

    async fn insert_generated_image(
        &self,
        image: &NewGeneratedImage,
    ) -> Result<i64, PixoraError> {
        self.inner.insert_generated_image(image).await
    }

    async fn list_generated_images(
        &self,
        user_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<GeneratedImage>, PixoraError> {
        self.inner.list_generated_images(user_id, limit).await
    }

    async fn delete_generated_image(
        &self,
        user_id: &str,
        id: i64,
    ) -> Result<Option<GeneratedImage>, PixoraError> {
        self.inner.delete_generated_image(user_id, id).await
    }

    async fn insert_order(&self, order: &PendingOrder) -> Result<(), PixoraError> {
        self.inner.insert_order(order).await
    }

    async fn get_order(&self, order_id: &str) -> Result<Option<PendingOrder>, PixoraError> {
        self.inner.get_order(order_id).await
    }

    async fn update_order_status(&self, order_id: &str, status: &str) -> Result<(), PixoraError> {
        self.inner.update_order_status(order_id, status).await
    }
}

#[tokio::test]
async fn lost_race_is_classified_against_the_same_record() {
    let f = submitted().await;
    let raced = TrainingStatusMachine::new(
        Arc::new(RacedStorage {
            inner: f.h.storage_adapter(),
        }),
        f.h.objects.clone(),
        Some(f.h.email.clone() as Arc<dyn EmailSender>),
        f.h.config.supabase.training_bucket.clone(),
        f.h.config.server.site_url.clone(),
    );

    let outcome = raced.handle(&f.correlation, &succeeded()).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Duplicate(TrainingStatus::Succeeded));

    let models = f.h.storage.list_models("u1").await.unwrap();
    assert_eq!(models.len(), 2);
    assert_eq!(models[0].training_status, TrainingStatus::Starting);
    assert_eq!(models[1].training_status, TrainingStatus::Succeeded);
    assert_eq!(f.h.email.sent_count().await, 0);
}
