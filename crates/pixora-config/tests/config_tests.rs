// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use pixora_config::{ConfigError, PixoraConfig, load_and_validate_str, load_config_from_str};

#[test]
fn empty_toml_yields_defaults() {
    let config = load_config_from_str("").unwrap();
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.server.site_url, "http://localhost:3000");
    assert_eq!(config.storage.database_path, "pixora.db");
    assert_eq!(config.replicate.trainer_owner, "ostris");
    assert_eq!(config.replicate.trainer_model, "flux-dev-lora-trainer");
    assert_eq!(config.replicate.hardware, "gpu-a100-large");
    assert_eq!(config.supabase.training_bucket, "TrainingData");
    assert_eq!(config.supabase.images_bucket, "GeneratedImages");
    assert_eq!(config.webhook.timestamp_tolerance_secs, 300);
    assert_eq!(config.credits.training_cost, 640);
    assert!(config.email.enabled);
    assert!(config.replicate.api_token.is_none());
}

#[test]
fn full_toml_overrides_defaults() {
    let toml = r#"
[server]
host = "0.0.0.0"
port = 8080
site_url = "https://pixora.app"
log_level = "debug"

[replicate]
api_token = "r8_test"
username = "pixora-labs"

[webhook]
signing_secret = "whsec_c2VjcmV0"
correlation_secret = "corr"

[supabase]
url = "https://xyz.supabase.co"
service_role_key = "service"

[email]
enabled = false

[paypal]
client_id = "id"
client_secret = "secret"
base_url = "https://api-m.sandbox.paypal.com"

[credits]
training_cost = 500
"#;
    let config = load_and_validate_str(toml).unwrap();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.replicate.api_token.as_deref(), Some("r8_test"));
    assert_eq!(config.replicate.username, "pixora-labs");
    assert_eq!(config.webhook.correlation_secret.as_deref(), Some("corr"));
    assert!(!config.email.enabled);
    assert_eq!(config.paypal.base_url, "https://api-m.sandbox.paypal.com");
    assert_eq!(config.credits.training_cost, 500);
    assert_eq!(config.credits.dev_per_image, 10);
}

#[test]
fn unknown_key_is_reported_with_suggestion() {
    let toml = "[replicate]\napi_tokn = \"r8\"\n";
    let errors = load_and_validate_str(toml).unwrap_err();
    let found = errors.iter().any(|e| {
        matches!(
            e,
            ConfigError::UnknownKey { key, suggestion: Some(s), .. }
                if key == "api_tokn" && s == "api_token"
        )
    });
    assert!(found, "got: {errors:?}");
}

#[test]
fn unknown_section_is_rejected() {
    let errors = load_and_validate_str("[telegram]\nbot_token = \"x\"\n").unwrap_err();
    assert!(!errors.is_empty());
}

#[test]
fn wrong_type_is_reported() {
    let errors = load_and_validate_str("[server]\nport = \"eighty\"\n").unwrap_err();
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. })),
        "got: {errors:?}"
    );
}

#[test]
fn semantic_validation_runs_after_parse() {
    let errors = load_and_validate_str("[webhook]\nsigning_secret = \"plain\"\n").unwrap_err();
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("whsec_")))
    );
}

#[test]
fn env_overrides_file_values() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("pixora.toml", "[server]\nport = 4000\n")?;
        jail.set_env("PIXORA_SERVER_PORT", "5000");
        jail.set_env("PIXORA_REPLICATE_API_TOKEN", "r8_env");
        jail.set_env("PIXORA_CREDITS_TRAINING_COST", "700");

        let config: PixoraConfig =
            pixora_config::load_config_from_path(std::path::Path::new("pixora.toml"))?;
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.replicate.api_token.as_deref(), Some("r8_env"));
        assert_eq!(config.credits.training_cost, 700);
        Ok(())
    });
}
