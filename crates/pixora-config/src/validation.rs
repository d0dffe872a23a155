// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde cannot express. All problems are collected;
//! validation never stops at the first one.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::diagnostic::ConfigError;
use crate::model::PixoraConfig;

/// Prefix every provider webhook signing secret carries.
pub const SIGNING_SECRET_PREFIX: &str = "whsec_";

/// Validate a deserialized configuration.
pub fn validate_config(config: &PixoraConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::validation("server.host must not be empty"));
    } else if host.parse::<std::net::IpAddr>().is_err()
        && !host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        errors.push(ConfigError::validation(format!(
            "server.host `{host}` is not a valid IP address or hostname"
        )));
    }

    match url::Url::parse(&config.server.site_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ConfigError::validation(format!(
            "server.site_url must use http or https, got `{}`",
            url.scheme()
        ))),
        Err(e) => errors.push(ConfigError::validation(format!(
            "server.site_url `{}` is not an absolute URL: {e}",
            config.server.site_url
        ))),
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    if let Some(secret) = &config.webhook.signing_secret {
        match secret.strip_prefix(SIGNING_SECRET_PREFIX) {
            None => errors.push(ConfigError::validation(format!(
                "webhook.signing_secret must start with `{SIGNING_SECRET_PREFIX}`"
            ))),
            Some(key) if STANDARD.decode(key).is_err() => errors.push(ConfigError::validation(
                "webhook.signing_secret key after `whsec_` is not valid base64",
            )),
            Some(_) => {}
        }
    }

    if config.webhook.timestamp_tolerance_secs == 0 {
        errors.push(ConfigError::validation(
            "webhook.timestamp_tolerance_secs must be greater than 0",
        ));
    }

    let credits = &config.credits;
    if credits.training_cost <= 0 {
        errors.push(ConfigError::validation(format!(
            "credits.training_cost must be greater than 0, got {}",
            credits.training_cost
        )));
    }
    for (key, value) in [
        ("signup_grant", credits.signup_grant),
        ("schnell_per_image", credits.schnell_per_image),
        ("dev_per_image", credits.dev_per_image),
        ("custom_per_image", credits.custom_per_image),
    ] {
        if value < 0 {
            errors.push(ConfigError::validation(format!(
                "credits.{key} must be non-negative, got {value}"
            )));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
