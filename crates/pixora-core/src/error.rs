// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Pixora back end.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// The primary error type used across all Pixora adapter traits and services.
#[derive(Debug, Error)]
pub enum PixoraError {
    /// Configuration errors (invalid TOML, missing secrets, bad URLs).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// External provider errors (Replicate, Supabase, PayPal, Resend).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Missing session, unknown identity, or a rejected webhook signature.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Request failed validation before any side effect was applied.
    #[error("validation error: {0}")]
    Validation(String),

    /// A debit would have taken the balance below zero.
    #[error("insufficient credits: {required} required, {available} available")]
    InsufficientCredits { required: i64, available: i64 },

    /// A referenced record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Machine-readable classification of a [`PixoraError`].
///
/// Exposed in HTTP error bodies so clients can branch on the failure without
/// parsing the message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Config,
    Storage,
    Provider,
    Unauthenticated,
    Validation,
    InsufficientCredits,
    NotFound,
    Timeout,
    Internal,
}

impl PixoraError {
    /// Shorthand for a provider error without an underlying source.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
            source: None,
        }
    }

    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Storage { .. } => ErrorKind::Storage,
            Self::Provider { .. } => ErrorKind::Provider,
            Self::Unauthenticated(_) => ErrorKind::Unauthenticated,
            Self::Validation(_) => ErrorKind::Validation,
            Self::InsufficientCredits { .. } => ErrorKind::InsufficientCredits,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether retrying the same call later may succeed. Only timeouts qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
