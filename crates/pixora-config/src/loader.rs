// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Merge order, later wins:
//! 1. Compiled defaults
//! 2. `/etc/pixora/pixora.toml`
//! 3. `~/.config/pixora/pixora.toml`
//! 4. `./pixora.toml`
//! 5. `PIXORA_*` environment variables

#![allow(clippy::result_large_err)] // figment::Error is external and large

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::PixoraConfig;

const SYSTEM_CONFIG: &str = "/etc/pixora/pixora.toml";
const LOCAL_CONFIG: &str = "pixora.toml";

/// Top-level sections an env var may address, e.g. `PIXORA_SERVER_PORT`.
const SECTIONS: &[&str] = &[
    "server",
    "storage",
    "replicate",
    "webhook",
    "supabase",
    "email",
    "paypal",
    "credits",
];

/// Config files consulted by [`load_config`], lowest precedence first.
pub fn config_file_candidates() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(SYSTEM_CONFIG)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("pixora").join(LOCAL_CONFIG));
    }
    paths.push(PathBuf::from(LOCAL_CONFIG));
    paths
}

/// Build the full layered Figment without extracting it.
pub fn build_figment() -> Figment {
    let figment = config_file_candidates()
        .into_iter()
        .fold(defaults(), |figment, path| figment.merge(Toml::file(path)));
    figment.merge(env_provider())
}

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<PixoraConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only. No files, no environment.
pub fn load_config_from_str(toml_content: &str) -> Result<PixoraConfig, figment::Error> {
    defaults().merge(Toml::string(toml_content)).extract()
}

/// Load configuration from one explicit file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PixoraConfig, figment::Error> {
    defaults()
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

fn defaults() -> Figment {
    Figment::new().merge(Serialized::defaults(PixoraConfig::default()))
}

/// Environment provider that maps `PIXORA_<SECTION>_<KEY>` to `section.key`.
///
/// Uses `Env::map` rather than `Env::split("_")`: keys such as `api_token`
/// contain underscores themselves.
fn env_provider() -> Env {
    Env::prefixed("PIXORA_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_first_section_only() {
        assert_eq!(map_env_key("replicate_api_token"), "replicate.api_token");
        assert_eq!(
            map_env_key("webhook_correlation_secret"),
            "webhook.correlation_secret"
        );
        assert_eq!(map_env_key("credits_training_cost"), "credits.training_cost");
        assert_eq!(map_env_key("server_site_url"), "server.site_url");
    }

    #[test]
    fn env_keys_arrive_uppercase() {
        assert_eq!(map_env_key("SERVER_PORT"), "server.port");
        assert_eq!(map_env_key("Replicate_API_Token"), "replicate.api_token");
    }

    #[test]
    fn unknown_env_prefix_passes_through() {
        assert_eq!(map_env_key("unknown_key"), "unknown_key");
    }

    #[test]
    fn candidates_end_with_local_file() {
        let paths = config_file_candidates();
        assert_eq!(paths.first(), Some(&PathBuf::from(SYSTEM_CONFIG)));
        assert_eq!(paths.last(), Some(&PathBuf::from(LOCAL_CONFIG)));
    }
}
