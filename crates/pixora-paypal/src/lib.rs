// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PayPal checkout adapter for Pixora.

pub mod client;

use std::time::Duration;

use async_trait::async_trait;
use pixora_config::model::PaypalConfig;
use pixora_core::types::{AdapterType, HealthStatus, PaymentOrder};
use pixora_core::{PaymentProvider, PixoraError, PluginAdapter};
use tracing::info;

use crate::client::PaypalClient;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct PaypalProvider {
    client: PaypalClient,
}

impl PaypalProvider {
    pub fn new(config: &PaypalConfig) -> Result<Self, PixoraError> {
        let (Some(id), Some(secret)) = (
            config.client_id.as_deref().filter(|s| !s.is_empty()),
            config.client_secret.as_deref().filter(|s| !s.is_empty()),
        ) else {
            return Err(PixoraError::Config(
                "paypal.client_id and paypal.client_secret must both be set".into(),
            ));
        };
        let client = PaypalClient::new(id, secret, &config.base_url, REQUEST_TIMEOUT)?;
        info!(base_url = %config.base_url, "PayPal provider initialized");
        Ok(Self { client })
    }
}

#[async_trait]
impl PluginAdapter for PaypalProvider {
    fn name(&self) -> &str {
        "paypal"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Payment
    }

    async fn health_check(&self) -> Result<HealthStatus, PixoraError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl PaymentProvider for PaypalProvider {
    async fn create_order(&self, amount: &str, currency: &str) -> Result<PaymentOrder, PixoraError> {
        self.client.create_order(amount, currency).await
    }

    async fn capture_order(&self, order_id: &str) -> Result<PaymentOrder, PixoraError> {
        self.client.capture_order(order_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_both_credentials() {
        let mut config = PaypalConfig::default();
        config.client_id = Some("cid".into());
        assert!(matches!(PaypalProvider::new(&config), Err(PixoraError::Config(_))));
        config.client_secret = Some("secret".into());
        let provider = PaypalProvider::new(&config).unwrap();
        assert_eq!(provider.adapter_type(), AdapterType::Payment);
    }
}
