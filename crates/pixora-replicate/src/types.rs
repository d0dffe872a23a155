// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Replicate API request and response types.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct CreateModelRequest<'a> {
    pub owner: &'a str,
    pub name: &'a str,
    pub visibility: &'a str,
    pub hardware: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CreateTrainingRequest<'a> {
    pub destination: &'a str,
    pub input: &'a serde_json::Value,
    pub webhook: &'a str,
    pub webhook_events_filter: &'a [String],
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainingResponse {
    pub id: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct VersionedPredictionRequest<'a> {
    pub version: &'a str,
    pub input: &'a serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct ModelPredictionRequest<'a> {
    pub input: &'a serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub output: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

impl Prediction {
    pub fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "succeeded" | "failed" | "canceled")
    }

    /// Image URLs in `output`, which is either a list or a single URL.
    pub fn image_urls(&self) -> Vec<String> {
        match &self.output {
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Some(serde_json::Value::String(url)) => vec![url.clone()],
            _ => Vec::new(),
        }
    }
}

/// Error body returned by the API (`application/problem+json`).
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: String,
}

/// A model reference: `owner/name` or `owner/name:version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelRef<'a> {
    Latest { owner: &'a str, name: &'a str },
    Version(&'a str),
}

impl<'a> ModelRef<'a> {
    pub fn parse(model: &'a str) -> Option<Self> {
        if let Some((_, version)) = model.split_once(':') {
            return (!version.is_empty()).then_some(Self::Version(version));
        }
        let (owner, name) = model.split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self::Latest { owner, name })
    }
}
