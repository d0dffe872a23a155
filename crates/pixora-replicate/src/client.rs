// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Replicate API.
//!
//! Every request carries the configured timeout; a timed-out request is
//! reported as [`PixoraError::Timeout`] so callers can tell it apart from a
//! definitive rejection. Nothing is retried here.

use std::time::Duration;

use pixora_core::PixoraError;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::types::{
    ApiErrorResponse, CreateModelRequest, CreateTrainingRequest, ModelPredictionRequest, ModelRef,
    Prediction, TrainingResponse, VersionedPredictionRequest,
};

/// Upper bound on how long a prediction is polled before giving up.
const PREDICTION_DEADLINE: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct ReplicateClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    poll_interval: Duration,
}

impl ReplicateClient {
    pub fn new(api_token: &str, base_url: &str, timeout: Duration) -> Result<Self, PixoraError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {api_token}"))
                .map_err(|e| PixoraError::Config(format!("invalid Replicate API token: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| PixoraError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            poll_interval: Duration::from_secs(1),
        })
    }

    /// Overrides the prediction polling interval (for tests).
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub async fn create_model(
        &self,
        owner: &str,
        name: &str,
        visibility: &str,
        hardware: &str,
    ) -> Result<(), PixoraError> {
        let body = CreateModelRequest {
            owner,
            name,
            visibility,
            hardware,
        };
        let _: serde_json::Value = self.post("/models", &body, None).await?;
        Ok(())
    }

    pub async fn create_training(
        &self,
        trainer_owner: &str,
        trainer_model: &str,
        trainer_version: &str,
        body: &CreateTrainingRequest<'_>,
    ) -> Result<TrainingResponse, PixoraError> {
        let path =
            format!("/models/{trainer_owner}/{trainer_model}/versions/{trainer_version}/trainings");
        self.post(&path, body, None).await
    }

    pub async fn cancel_training(&self, training_id: &str) -> Result<(), PixoraError> {
        let path = format!("/trainings/{training_id}/cancel");
        let _: serde_json::Value = self.post(&path, &serde_json::json!({}), None).await?;
        Ok(())
    }

    /// Runs `model` to completion and returns the finished prediction.
    pub async fn predict(
        &self,
        model: &str,
        input: &serde_json::Value,
    ) -> Result<Prediction, PixoraError> {
        let reference = ModelRef::parse(model).ok_or_else(|| {
            PixoraError::Validation(format!(
                "model must be `owner/name` or `owner/name:version`, got `{model}`"
            ))
        })?;

        let mut prediction: Prediction = match reference {
            ModelRef::Latest { owner, name } => {
                let path = format!("/models/{owner}/{name}/predictions");
                self.post(&path, &ModelPredictionRequest { input }, Some("wait"))
                    .await?
            }
            ModelRef::Version(version) => {
                let body = VersionedPredictionRequest { version, input };
                self.post("/predictions", &body, Some("wait")).await?
            }
        };

        let deadline = tokio::time::Instant::now() + PREDICTION_DEADLINE;
        while !prediction.is_terminal() {
            if tokio::time::Instant::now() >= deadline {
                return Err(PixoraError::Timeout {
                    duration: PREDICTION_DEADLINE,
                });
            }
            tokio::time::sleep(self.poll_interval).await;
            prediction = self.get(&format!("/predictions/{}", prediction.id)).await?;
            debug!(prediction_id = %prediction.id, status = %prediction.status, "polled prediction");
        }

        if prediction.status != "succeeded" {
            let detail = prediction
                .error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_else(|| prediction.status.clone());
            return Err(PixoraError::provider(format!(
                "prediction {} {}: {detail}",
                prediction.id, prediction.status
            )));
        }
        Ok(prediction)
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        prefer: Option<&str>,
    ) -> Result<T, PixoraError> {
        let mut request = self.client.post(format!("{}{path}", self.base_url)).json(body);
        if let Some(prefer) = prefer {
            request = request.header("prefer", prefer);
        }
        let response = request.send().await.map_err(|e| self.send_error(e))?;
        self.decode(path, response).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, PixoraError> {
        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        self.decode(path, response).await
    }

    /// Downloads a prediction output file.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, PixoraError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(PixoraError::provider(format!(
                "output download returned {status}"
            )));
        }
        let bytes = response.bytes().await.map_err(|e| self.send_error(e))?;
        debug!(url, len = bytes.len(), "prediction output downloaded");
        Ok(bytes.to_vec())
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, PixoraError> {
        let status = response.status();
        debug!(status = %status, path, "Replicate response received");
        let text = response.text().await.map_err(|e| self.send_error(e))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ApiErrorResponse>(&text) {
                Ok(err) => format!(
                    "Replicate API error ({status}{}): {}",
                    err.title.map(|t| format!(", {t}")).unwrap_or_default(),
                    err.detail
                ),
                Err(_) => format!("Replicate API returned {status}: {text}"),
            };
            return Err(PixoraError::provider(message));
        }

        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str(text).map_err(|e| PixoraError::Provider {
            message: format!("failed to parse Replicate response: {e}"),
            source: Some(Box::new(e)),
        })
    }

    fn send_error(&self, e: reqwest::Error) -> PixoraError {
        if e.is_timeout() {
            return PixoraError::Timeout {
                duration: self.timeout,
            };
        }
        PixoraError::Provider {
            message: format!("Replicate request failed: {e}"),
            source: Some(Box::new(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ReplicateClient {
        ReplicateClient::new("r8_test", &server.uri(), Duration::from_secs(5))
            .unwrap()
            .with_poll_interval(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn create_training_targets_trainer_version() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/ostris/flux-dev-lora-trainer/versions/f754/trainings"))
            .and(header("authorization", "Bearer r8_test"))
            .and(body_partial_json(json!({
                "destination": "pixora/u1_1_cats",
                "webhook_events_filter": ["start", "completed"]
            })))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"id": "t1", "status": "starting"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let input = json!({"steps": 1000});
        let events = vec!["start".to_string(), "completed".to_string()];
        let body = CreateTrainingRequest {
            destination: "pixora/u1_1_cats",
            input: &input,
            webhook: "https://pixora.app/api/webhooks/training?user-id=u1",
            webhook_events_filter: &events,
        };
        let job = client(&server)
            .create_training("ostris", "flux-dev-lora-trainer", "f754", &body)
            .await
            .unwrap();
        assert_eq!(job.id, "t1");
        assert_eq!(job.status, "starting");
    }

    #[tokio::test]
    async fn predict_polls_until_done() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/black-forest-labs/flux-schnell/predictions"))
            .and(header("prefer", "wait"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({"id": "p1", "status": "processing"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/predictions/p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "p1", "status": "succeeded", "output": ["https://img/1.webp"]
            })))
            .mount(&server)
            .await;

        let prediction = client(&server)
            .predict("black-forest-labs/flux-schnell", &json!({"prompt": "a cat"}))
            .await
            .unwrap();
        assert_eq!(prediction.image_urls(), vec!["https://img/1.webp"]);
    }

    #[tokio::test]
    async fn versioned_model_uses_predictions_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predictions"))
            .and(body_partial_json(json!({"version": "abcd1234"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "p2", "status": "succeeded", "output": ["https://img/2.png"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let prediction = client(&server)
            .predict("pixora/u1_1_cats:abcd1234", &json!({"prompt": "TOK cat"}))
            .await
            .unwrap();
        assert_eq!(prediction.id, "p2");
    }

    #[tokio::test]
    async fn failed_prediction_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predictions"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "p3", "status": "failed", "error": "NSFW content detected"
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .predict("o/m:v1", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, PixoraError::Provider { .. }));
        assert!(err.to_string().contains("NSFW"), "got: {err}");
    }

    #[tokio::test]
    async fn api_error_detail_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "title": "Conflict", "detail": "A model with that name already exists"
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .create_model("pixora", "dup", "private", "gpu-a100-large")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already exists"), "got: {err}");
    }

    #[tokio::test]
    async fn slow_response_is_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/trainings/t1/cancel"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = ReplicateClient::new("r8_test", &server.uri(), Duration::from_millis(50)).unwrap();
        let err = client.cancel_training("t1").await.unwrap_err();
        assert!(matches!(err, PixoraError::Timeout { .. }), "got: {err}");
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn malformed_model_reference_is_validation_error() {
        let server = MockServer::start().await;
        let err = client(&server).predict("flux", &json!({})).await.unwrap_err();
        assert!(matches!(err, PixoraError::Validation(_)));
    }

    #[tokio::test]
    async fn download_returns_body_and_rejects_missing_files() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/delivery/out-0.webp"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"RIFFwebp".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/delivery/gone.webp"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let c = client(&server);
        let bytes = c
            .download(&format!("{}/delivery/out-0.webp", server.uri()))
            .await
            .unwrap();
        assert_eq!(bytes, b"RIFFwebp");
        let err = c
            .download(&format!("{}/delivery/gone.webp", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, PixoraError::Provider { .. }));
    }
}
