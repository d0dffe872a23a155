// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Pixora back end.
//!
//! This crate provides the foundational trait definitions, error types, and
//! domain types used throughout the Pixora workspace. Every external
//! collaborator (datastore, object storage, identity, model providers, email,
//! payments) sits behind a trait defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{ErrorKind, PixoraError};
pub use types::{AdapterType, HealthStatus, TrainingStatus};

// Re-export all adapter traits at crate root.
pub use traits::{
    EmailSender, IdentityProvider, ImageGenerator, ObjectStorage, PaymentProvider, PluginAdapter,
    StorageAdapter, TrainingProvider,
};

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::types::Hyperparameters;

    #[test]
    fn error_kinds_match_variants() {
        let cases = [
            (PixoraError::Config("x".into()), ErrorKind::Config),
            (
                PixoraError::Storage {
                    source: Box::new(std::io::Error::other("x")),
                },
                ErrorKind::Storage,
            ),
            (PixoraError::provider("x"), ErrorKind::Provider),
            (PixoraError::Unauthenticated("x".into()), ErrorKind::Unauthenticated),
            (PixoraError::Validation("x".into()), ErrorKind::Validation),
            (
                PixoraError::InsufficientCredits {
                    required: 640,
                    available: 500,
                },
                ErrorKind::InsufficientCredits,
            ),
            (PixoraError::NotFound("x".into()), ErrorKind::NotFound),
            (
                PixoraError::Timeout {
                    duration: std::time::Duration::from_secs(30),
                },
                ErrorKind::Timeout,
            ),
            (PixoraError::Internal("x".into()), ErrorKind::Internal),
        ];
        for (err, kind) in cases {
            assert_eq!(err.kind(), kind, "{err}");
        }
    }

    #[test]
    fn only_timeouts_are_retryable() {
        let timeout = PixoraError::Timeout {
            duration: std::time::Duration::from_secs(1),
        };
        assert!(timeout.is_retryable());
        assert!(!PixoraError::Unauthenticated("bad signature".into()).is_retryable());
        assert!(!PixoraError::provider("422").is_retryable());
    }

    #[test]
    fn insufficient_credits_message_names_both_amounts() {
        let err = PixoraError::InsufficientCredits {
            required: 640,
            available: 500,
        };
        let msg = err.to_string();
        assert!(msg.contains("640") && msg.contains("500"), "got: {msg}");
    }

    #[test]
    fn error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::InsufficientCredits).unwrap();
        assert_eq!(json, "\"insufficient_credits\"");
        assert_eq!(ErrorKind::NotFound.to_string(), "not_found");
    }

    #[test]
    fn training_status_parses_provider_lowercase() {
        assert_eq!(
            TrainingStatus::from_str("processing").unwrap(),
            TrainingStatus::Processing
        );
        assert_eq!(
            TrainingStatus::from_str("SUCCEEDED").unwrap(),
            TrainingStatus::Succeeded
        );
        assert!(TrainingStatus::from_str("queued").is_err());
        assert_eq!(TrainingStatus::Canceled.to_string(), "CANCELED");
    }

    #[test]
    fn terminal_states() {
        assert!(!TrainingStatus::Starting.is_terminal());
        assert!(!TrainingStatus::Processing.is_terminal());
        assert!(TrainingStatus::Succeeded.is_terminal());
        assert!(TrainingStatus::Failed.is_terminal());
        assert!(TrainingStatus::Canceled.is_terminal());
    }

    #[test]
    fn hyperparameter_defaults() {
        let hp = Hyperparameters::default();
        assert_eq!(hp.steps, 1000);
        assert_eq!(hp.lora_rank, 16);
        assert_eq!(hp.optimizer, "adamw8bit");
        assert_eq!(hp.batch_size, 1);
        assert_eq!(hp.resolution, "512,768,1024");
        assert!(hp.autocaption);
        assert_eq!(hp.trigger_word, "TOK");
        assert!((hp.learning_rate - 0.0004).abs() < f64::EPSILON);
        assert!((hp.caption_dropout_rate - 0.05).abs() < f64::EPSILON);
        assert!(!hp.cache_latents_to_disk);
        assert!(!hp.gradient_checkpointing);
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
        fn _assert_identity_provider<T: IdentityProvider>() {}
        fn _assert_object_storage<T: ObjectStorage>() {}
        fn _assert_training_provider<T: TrainingProvider>() {}
        fn _assert_image_generator<T: ImageGenerator>() {}
        fn _assert_email_sender<T: EmailSender>() {}
        fn _assert_payment_provider<T: PaymentProvider>() {}
    }
}
