// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Paid image generation against base or user-trained models.

use std::sync::Arc;

use pixora_core::types::NewGeneratedImage;
use pixora_core::{ImageGenerator, ObjectStorage, PixoraError, StorageAdapter};
use pixora_credits::{CreditLedger, CreditReason, Pricing};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const MAX_OUTPUTS: u32 = 4;

const IMAGE_FORMATS: &[&str] = &["webp", "png", "jpg", "jpeg"];

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationRequest {
    /// `owner/name` or `owner/name:version`.
    pub model: String,
    pub prompt: String,
    #[serde(default = "default_num_outputs")]
    pub num_outputs: u32,
    pub output_format: Option<String>,
    pub aspect_ratio: Option<String>,
    pub num_inference_steps: Option<i64>,
    pub guidance: Option<f64>,
    /// Extra provider inputs, forwarded untouched.
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

fn default_num_outputs() -> u32 {
    1
}

impl GenerationRequest {
    fn validate(&self) -> Result<(), PixoraError> {
        if self.model.trim().is_empty() {
            return Err(PixoraError::Validation("model is required".into()));
        }
        if self.prompt.trim().is_empty() {
            return Err(PixoraError::Validation("prompt is required".into()));
        }
        if !(1..=MAX_OUTPUTS).contains(&self.num_outputs) {
            return Err(PixoraError::Validation(format!(
                "num_outputs must be between 1 and {MAX_OUTPUTS}"
            )));
        }
        Ok(())
    }

    /// Provider input object: the extras plus the typed fields.
    pub fn provider_input(&self) -> Value {
        let mut input = self.extra.clone();
        input.insert("prompt".into(), Value::from(self.prompt.clone()));
        input.insert("num_outputs".into(), Value::from(self.num_outputs));
        if let Some(v) = &self.output_format {
            input.insert("output_format".into(), Value::from(v.clone()));
        }
        if let Some(v) = &self.aspect_ratio {
            input.insert("aspect_ratio".into(), Value::from(v.clone()));
        }
        if let Some(v) = self.num_inference_steps {
            input.insert("num_inference_steps".into(), Value::from(v));
        }
        if let Some(v) = self.guidance {
            input.insert("guidance".into(), Value::from(v));
        }
        Value::Object(input)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationResult {
    pub images: Vec<String>,
    pub credits: i64,
}

/// File extension for a stored output: the requested format, else the
/// extension of the output URL, else `webp`.
fn image_extension(output_format: Option<&str>, url: &str) -> String {
    let from_url = url
        .split(['?', '#'])
        .next()
        .and_then(|path| path.rsplit_once('.'))
        .map(|(_, ext)| ext);
    output_format
        .into_iter()
        .chain(from_url)
        .map(str::to_ascii_lowercase)
        .find(|ext| IMAGE_FORMATS.contains(&ext.as_str()))
        .unwrap_or_else(|| "webp".to_string())
}

fn content_type(ext: &str) -> String {
    match ext {
        "jpg" => "image/jpeg".to_string(),
        other => format!("image/{other}"),
    }
}

pub struct ImageGenerationService {
    storage: Arc<dyn StorageAdapter>,
    generator: Arc<dyn ImageGenerator>,
    object_storage: Arc<dyn ObjectStorage>,
    ledger: CreditLedger,
    pricing: Pricing,
    bucket: String,
}

impl ImageGenerationService {
    /// Outputs are copied into `bucket` under `{owner}/genImg_<uuid>.<ext>`.
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        generator: Arc<dyn ImageGenerator>,
        object_storage: Arc<dyn ObjectStorage>,
        ledger: CreditLedger,
        pricing: Pricing,
        bucket: String,
    ) -> Self {
        Self {
            storage,
            generator,
            object_storage,
            ledger,
            pricing,
            bucket,
        }
    }

    /// Copy one provider output into the images bucket and return its file name.
    async fn store_output(
        &self,
        user_id: &str,
        url: &str,
        output_format: Option<&str>,
    ) -> Result<String, PixoraError> {
        let bytes = self.generator.download(url).await?;
        let ext = image_extension(output_format, url);
        let file_name = format!("genImg_{}.{ext}", Uuid::new_v4());
        self.object_storage
            .upload(
                &self.bucket,
                &format!("{user_id}/{file_name}"),
                bytes,
                &content_type(&ext),
            )
            .await?;
        debug!(user_id, file_name = %file_name, "generated image stored");
        Ok(file_name)
    }

    /// Charge, generate, store and record images. The charge is refunded if
    /// the provider call fails. An output that cannot be stored is still
    /// returned but left out of the gallery.
    pub async fn generate(
        &self,
        user_id: &str,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, PixoraError> {
        request.validate()?;

        let cost = self.pricing.generation_cost(&request.model, request.num_outputs);
        let mut balance = self
            .ledger
            .decrement(user_id, cost, CreditReason::Generation, None)
            .await?;

        let images = match self.generator.run(&request.model, &request.provider_input()).await {
            Ok(images) => images,
            Err(e) => {
                warn!(user_id, model = %request.model, error = %e, "generation failed, refunding");
                if let Err(refund_err) = self
                    .ledger
                    .increment(user_id, cost, CreditReason::Refund, None)
                    .await
                {
                    warn!(user_id, amount = cost, error = %refund_err, "generation refund failed");
                }
                return Err(e);
            }
        };

        // Charge only for what came back.
        let missing = i64::from(request.num_outputs).saturating_sub(images.len() as i64);
        if missing > 0 {
            let refund = self.pricing.per_image(&request.model).saturating_mul(missing);
            match self
                .ledger
                .increment(user_id, refund, CreditReason::Refund, None)
                .await
            {
                Ok(b) => balance = b,
                Err(e) => warn!(user_id, amount = refund, error = %e, "partial generation refund failed"),
            }
        }

        for image in &images {
            let image_name = match self
                .store_output(user_id, image, request.output_format.as_deref())
                .await
            {
                Ok(name) => name,
                Err(e) => {
                    warn!(user_id, error = %e, "failed to store generated image");
                    continue;
                }
            };
            let row = NewGeneratedImage {
                user_id: user_id.to_string(),
                model_name: request.model.clone(),
                image_name,
                prompt: request.prompt.clone(),
                output_format: request.output_format.clone(),
                aspect_ratio: request.aspect_ratio.clone(),
                num_inference_steps: request.num_inference_steps,
                guidance: request.guidance,
            };
            if let Err(e) = self.storage.insert_generated_image(&row).await {
                warn!(user_id, error = %e, "failed to record generated image");
            }
        }
        if !images.is_empty()
            && let Err(e) = self
                .storage
                .increment_images_generated(user_id, images.len() as i64)
                .await
        {
            warn!(user_id, error = %e, "failed to bump images_generated");
        }

        info!(user_id, model = %request.model, count = images.len(), "images generated");
        Ok(GenerationResult {
            images,
            credits: balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> GenerationRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn num_outputs_defaults_to_one() {
        let r = request(r#"{"model":"black-forest-labs/flux-schnell","prompt":"a cat"}"#);
        assert_eq!(r.num_outputs, 1);
        assert!(r.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_outputs_and_blank_prompt() {
        let r = request(r#"{"model":"m/x","prompt":"a cat","num_outputs":5}"#);
        assert!(matches!(r.validate(), Err(PixoraError::Validation(_))));
        let r = request(r#"{"model":"m/x","prompt":"a cat","num_outputs":0}"#);
        assert!(r.validate().is_err());
        let r = request(r#"{"model":"m/x","prompt":"   "}"#);
        assert!(r.validate().is_err());
    }

    #[test]
    fn extension_prefers_requested_format_then_url() {
        assert_eq!(image_extension(Some("PNG"), "https://x/out.webp"), "png");
        assert_eq!(image_extension(None, "https://x/out-0.jpg?sig=1"), "jpg");
        assert_eq!(image_extension(Some("gif"), "https://x/out"), "webp");
        assert_eq!(content_type("jpg"), "image/jpeg");
        assert_eq!(content_type("webp"), "image/webp");
    }

    #[test]
    fn provider_input_merges_extras() {
        let r = request(
            r#"{"model":"m/x","prompt":"a cat","num_outputs":2,"aspect_ratio":"16:9",
                "guidance":3.5,"go_fast":true,"megapixels":"1"}"#,
        );
        let input = r.provider_input();
        assert_eq!(input["prompt"], "a cat");
        assert_eq!(input["num_outputs"], 2);
        assert_eq!(input["aspect_ratio"], "16:9");
        assert_eq!(input["guidance"], 3.5);
        assert_eq!(input["go_fast"], true);
        assert_eq!(input["megapixels"], "1");
        assert!(input.get("output_format").is_none());
    }
}
