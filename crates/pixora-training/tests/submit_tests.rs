// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Training submission against mock collaborators and a temp database.

use std::time::Duration;

use pixora_core::{PixoraError, TrainingStatus};
use pixora_credits::CreditReason;
use pixora_test_utils::TestHarness;
use pixora_training::correlation::extract_from_url;
use pixora_training::{
    CorrelationSigner, SubmitterSettings, TrainingJobSubmitter, TrainingSubmission,
};

fn submitter(h: &TestHarness) -> TrainingJobSubmitter {
    let submitter = TrainingJobSubmitter::new(
        h.storage_adapter(),
        h.objects.clone(),
        h.models.clone(),
        h.ledger.clone(),
        h.pricing.clone(),
        SubmitterSettings::from_config(&h.config),
    );
    match &h.config.webhook.correlation_secret {
        Some(secret) => submitter.with_signer(
            CorrelationSigner::new(
                secret,
                Duration::from_secs(h.config.webhook.correlation_ttl_secs),
            )
            .unwrap(),
        ),
        None => submitter,
    }
}

fn cats() -> TrainingSubmission {
    TrainingSubmission {
        file_key: "TrainingData/u1/cats.zip".into(),
        model_name: "My Cats".into(),
        ..TrainingSubmission::default()
    }
}

#[tokio::test]
async fn submit_charges_and_records_starting_model() {
    let h = TestHarness::builder().build().await.unwrap();
    h.add_user("tok", "u1", 1000).await.unwrap();

    let submitted = submitter(&h).submit("u1", &cats()).await.unwrap();
    assert_eq!(submitted.credits, 360);
    assert_eq!(h.balance("u1").await.unwrap(), 360);

    let record = h.model("u1", "My Cats").await.unwrap().unwrap();
    assert_eq!(record.id, submitted.model_record_id);
    assert_eq!(record.training_id, submitted.training_id);
    assert_eq!(record.training_status, TrainingStatus::Starting);
    assert!(record.model_id.starts_with("u1_") && record.model_id.ends_with("_my-cats"));
    assert_eq!(record.hyperparameters.steps, 1000);

    assert_eq!(
        h.objects.signed().await,
        vec![("TrainingData".to_string(), "u1/cats.zip".to_string())]
    );

    let models = h.models.created_models().await;
    assert_eq!(models.len(), 1);
    assert_eq!(models[0].owner, "pixora");
    assert_eq!(models[0].visibility, "private");
    assert_eq!(models[0].hardware, "gpu-a100-large");

    let trainings = h.models.trainings().await;
    assert_eq!(trainings.len(), 1);
    let training = &trainings[0];
    assert_eq!(training.destination, format!("pixora/{}", record.model_id));
    assert_eq!(training.webhook_events_filter, vec!["start", "completed"]);
    assert!(
        training.input["input_images"]
            .as_str()
            .unwrap()
            .contains("u1/cats.zip")
    );
    assert!(training.webhook.starts_with("https://pixora.test/api/webhooks/training?"));

    let params = extract_from_url(&training.webhook).unwrap();
    assert_eq!(params.correlation.user_id, "u1");
    assert_eq!(params.correlation.model_name, "My Cats");
    assert_eq!(params.correlation.file_path, "u1/cats.zip");
    assert!(params.token.is_none());

    let reasons: Vec<_> = h
        .ledger
        .transactions("u1")
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.reason)
        .collect();
    assert!(reasons.contains(&CreditReason::Training.to_string()));
}

#[tokio::test]
async fn insufficient_credits_makes_no_provider_calls() {
    let h = TestHarness::builder().build().await.unwrap();
    h.add_user("tok", "u1", 500).await.unwrap();

    let err = submitter(&h).submit("u1", &cats()).await.unwrap_err();
    assert!(matches!(
        err,
        PixoraError::InsufficientCredits {
            required: 640,
            available: 500
        }
    ));
    assert_eq!(h.balance("u1").await.unwrap(), 500);
    assert_eq!(h.models.call_count().await, 0);
    assert!(h.objects.signed().await.is_empty());
    assert!(h.model("u1", "My Cats").await.unwrap().is_none());
}

#[tokio::test]
async fn provider_failure_refunds_the_charge() {
    let h = TestHarness::builder().build().await.unwrap();
    h.add_user("tok", "u1", 1000).await.unwrap();
    h.models.fail_create_training(true);

    let err = submitter(&h).submit("u1", &cats()).await.unwrap_err();
    assert!(matches!(err, PixoraError::Provider { .. }));
    assert_eq!(h.balance("u1").await.unwrap(), 1000);
    assert!(h.model("u1", "My Cats").await.unwrap().is_none());

    let refunds = h
        .ledger
        .transactions("u1")
        .await
        .unwrap()
        .into_iter()
        .filter(|t| t.reason == CreditReason::Refund.to_string())
        .count();
    assert_eq!(refunds, 1);
}

#[tokio::test]
async fn storage_failure_before_provider_refunds() {
    let h = TestHarness::builder().build().await.unwrap();
    h.add_user("tok", "u1", 1000).await.unwrap();
    h.objects.fail_sign(true);

    assert!(submitter(&h).submit("u1", &cats()).await.is_err());
    assert_eq!(h.balance("u1").await.unwrap(), 1000);
    assert_eq!(h.models.call_count().await, 0);
}

#[tokio::test]
async fn missing_fields_are_rejected_before_charging() {
    let h = TestHarness::builder().build().await.unwrap();
    h.add_user("tok", "u1", 1000).await.unwrap();

    let submission = TrainingSubmission {
        model_name: "My Cats".into(),
        ..TrainingSubmission::default()
    };
    let err = submitter(&h).submit("u1", &submission).await.unwrap_err();
    assert!(matches!(err, PixoraError::Validation(_)));
    assert_eq!(h.balance("u1").await.unwrap(), 1000);
}

#[tokio::test]
async fn correlation_secret_adds_verifiable_token() {
    let h = TestHarness::builder()
        .with_correlation_secret("corr-secret")
        .build()
        .await
        .unwrap();
    h.add_user("tok", "u1", 1000).await.unwrap();

    submitter(&h).submit("u1", &cats()).await.unwrap();
    let webhook = h.models.trainings().await[0].webhook.clone();
    let params = extract_from_url(&webhook).unwrap();
    assert!(params.token.is_some() && params.expires.is_some());

    let signer = CorrelationSigner::new("corr-secret", Duration::from_secs(60)).unwrap();
    assert!(signer.verify(&params, chrono::Utc::now().timestamp()).is_ok());
}

#[tokio::test]
async fn hyperparameter_overrides_reach_provider_and_record() {
    let h = TestHarness::builder().build().await.unwrap();
    h.add_user("tok", "u1", 1000).await.unwrap();

    let submission: TrainingSubmission = serde_json::from_value(serde_json::json!({
        "fileKey": "u1/dogs.zip",
        "modelName": "Dogs",
        "steps": 2000,
        "triggerWord": "DOGGO",
        "autocaption": false
    }))
    .unwrap();
    submitter(&h).submit("u1", &submission).await.unwrap();

    let trainings = h.models.trainings().await;
    let input = &trainings[0].input;
    assert_eq!(input["steps"], 2000);
    assert_eq!(input["trigger_word"], "DOGGO");
    assert_eq!(input["autocaption"], false);

    let record = h.model("u1", "Dogs").await.unwrap().unwrap();
    assert_eq!(record.hyperparameters.steps, 2000);
    assert_eq!(record.hyperparameters.trigger_word, "DOGGO");
    // A key without the bucket prefix is used as-is.
    assert_eq!(h.objects.signed().await[0].1, "u1/dogs.zip");
}
