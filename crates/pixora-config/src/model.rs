// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Pixora back end.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages. Structs that
//! hold secrets implement `Debug` by hand so tokens never reach the logs.

use serde::{Deserialize, Serialize};

/// Top-level Pixora configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PixoraConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Replicate (training + generation provider) settings.
    #[serde(default)]
    pub replicate: ReplicateConfig,

    /// Inbound training webhook settings.
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Supabase identity and object storage settings.
    #[serde(default)]
    pub supabase: SupabaseConfig,

    /// Transactional email settings.
    #[serde(default)]
    pub email: EmailConfig,

    /// PayPal checkout settings.
    #[serde(default)]
    pub paypal: PaypalConfig,

    /// Credit pricing settings.
    #[serde(default)]
    pub credits: CreditsConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Public base URL of this service; the training callback URL is built on it.
    #[serde(default = "default_site_url")]
    pub site_url: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            site_url: default_site_url(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_site_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    "pixora.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Replicate API configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReplicateConfig {
    /// API token. `None` leaves training and generation unavailable.
    #[serde(default)]
    pub api_token: Option<String>,

    /// API base URL.
    #[serde(default = "default_replicate_base_url")]
    pub base_url: String,

    /// Account that owns the destination models.
    #[serde(default = "default_replicate_username")]
    pub username: String,

    /// Owner of the LoRA trainer model.
    #[serde(default = "default_trainer_owner")]
    pub trainer_owner: String,

    /// Name of the LoRA trainer model.
    #[serde(default = "default_trainer_model")]
    pub trainer_model: String,

    /// Pinned trainer version hash.
    #[serde(default = "default_trainer_version")]
    pub trainer_version: String,

    /// Hardware SKU for destination models.
    #[serde(default = "default_hardware")]
    pub hardware: String,

    /// Timeout applied to every outbound request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ReplicateConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            base_url: default_replicate_base_url(),
            username: default_replicate_username(),
            trainer_owner: default_trainer_owner(),
            trainer_model: default_trainer_model(),
            trainer_version: default_trainer_version(),
            hardware: default_hardware(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for ReplicateConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicateConfig")
            .field("api_token", &self.api_token.as_ref().map(|_| "[redacted]"))
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("trainer_owner", &self.trainer_owner)
            .field("trainer_model", &self.trainer_model)
            .field("trainer_version", &self.trainer_version)
            .field("hardware", &self.hardware)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn default_replicate_base_url() -> String {
    "https://api.replicate.com/v1".to_string()
}

fn default_replicate_username() -> String {
    "pixora".to_string()
}

fn default_trainer_owner() -> String {
    "ostris".to_string()
}

fn default_trainer_model() -> String {
    "flux-dev-lora-trainer".to_string()
}

fn default_trainer_version() -> String {
    "f754b6d9684dd83291baa1a7f417bbc176ff5515a2a4d45930ed73a075876d4b".to_string()
}

fn default_hardware() -> String {
    "gpu-a100-large".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Inbound training webhook configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookConfig {
    /// Provider signing secret, `whsec_<base64 key>`.
    #[serde(default)]
    pub signing_secret: Option<String>,

    /// Maximum age (either direction) of the `webhook-timestamp` header.
    #[serde(default = "default_timestamp_tolerance_secs")]
    pub timestamp_tolerance_secs: u64,

    /// Key for the signed correlation token. `None` sends the plain triple only.
    #[serde(default)]
    pub correlation_secret: Option<String>,

    /// Lifetime of a correlation token.
    #[serde(default = "default_correlation_ttl_secs")]
    pub correlation_ttl_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            signing_secret: None,
            timestamp_tolerance_secs: default_timestamp_tolerance_secs(),
            correlation_secret: None,
            correlation_ttl_secs: default_correlation_ttl_secs(),
        }
    }
}

impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookConfig")
            .field(
                "signing_secret",
                &self.signing_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("timestamp_tolerance_secs", &self.timestamp_tolerance_secs)
            .field(
                "correlation_secret",
                &self.correlation_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("correlation_ttl_secs", &self.correlation_ttl_secs)
            .finish()
    }
}

fn default_timestamp_tolerance_secs() -> u64 {
    300
}

fn default_correlation_ttl_secs() -> u64 {
    7 * 24 * 60 * 60
}

/// Supabase identity and storage configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    #[serde(default)]
    pub url: Option<String>,

    /// Service role key used for storage administration.
    #[serde(default)]
    pub service_role_key: Option<String>,

    /// Bucket holding uploaded training archives.
    #[serde(default = "default_training_bucket")]
    pub training_bucket: String,

    /// Bucket holding generated images, one folder per owner.
    #[serde(default = "default_images_bucket")]
    pub images_bucket: String,

    /// Lifetime of signed download URLs.
    #[serde(default = "default_signed_url_ttl_secs")]
    pub signed_url_ttl_secs: u64,

    /// Timeout applied to every outbound request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            service_role_key: None,
            training_bucket: default_training_bucket(),
            images_bucket: default_images_bucket(),
            signed_url_ttl_secs: default_signed_url_ttl_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field(
                "service_role_key",
                &self.service_role_key.as_ref().map(|_| "[redacted]"),
            )
            .field("training_bucket", &self.training_bucket)
            .field("images_bucket", &self.images_bucket)
            .field("signed_url_ttl_secs", &self.signed_url_ttl_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn default_training_bucket() -> String {
    "TrainingData".to_string()
}

fn default_images_bucket() -> String {
    "GeneratedImages".to_string()
}

fn default_signed_url_ttl_secs() -> u64 {
    3600
}

/// Transactional email configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmailConfig {
    /// Send training notifications at all.
    #[serde(default = "default_email_enabled")]
    pub enabled: bool,

    /// Resend API key.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Sender address.
    #[serde(default = "default_email_from")]
    pub from: String,

    /// API base URL.
    #[serde(default = "default_email_base_url")]
    pub base_url: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: default_email_enabled(),
            api_key: None,
            from: default_email_from(),
            base_url: default_email_base_url(),
        }
    }
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("enabled", &self.enabled)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("from", &self.from)
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn default_email_enabled() -> bool {
    true
}

fn default_email_from() -> String {
    "Pixora <noreply@pixora.app>".to_string()
}

fn default_email_base_url() -> String {
    "https://api.resend.com".to_string()
}

/// PayPal checkout configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PaypalConfig {
    /// OAuth client id.
    #[serde(default)]
    pub client_id: Option<String>,

    /// OAuth client secret.
    #[serde(default)]
    pub client_secret: Option<String>,

    /// API base URL (live or sandbox).
    #[serde(default = "default_paypal_base_url")]
    pub base_url: String,
}

impl Default for PaypalConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            base_url: default_paypal_base_url(),
        }
    }
}

impl std::fmt::Debug for PaypalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaypalConfig")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn default_paypal_base_url() -> String {
    "https://api-m.paypal.com".to_string()
}

/// Credit pricing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CreditsConfig {
    /// Credits charged per training submission.
    #[serde(default = "default_training_cost")]
    pub training_cost: i64,

    /// Credits granted when a profile is first created.
    #[serde(default = "default_signup_grant")]
    pub signup_grant: i64,

    /// Credits per image on the schnell model.
    #[serde(default = "default_schnell_per_image")]
    pub schnell_per_image: i64,

    /// Credits per image on the dev model.
    #[serde(default = "default_dev_per_image")]
    pub dev_per_image: i64,

    /// Credits per image on a user-trained model.
    #[serde(default = "default_custom_per_image")]
    pub custom_per_image: i64,
}

impl Default for CreditsConfig {
    fn default() -> Self {
        Self {
            training_cost: default_training_cost(),
            signup_grant: default_signup_grant(),
            schnell_per_image: default_schnell_per_image(),
            dev_per_image: default_dev_per_image(),
            custom_per_image: default_custom_per_image(),
        }
    }
}

fn default_training_cost() -> i64 {
    640
}

fn default_signup_grant() -> i64 {
    10
}

fn default_schnell_per_image() -> i64 {
    2
}

fn default_dev_per_image() -> i64 {
    10
}

fn default_custom_per_image() -> i64 {
    10
}
