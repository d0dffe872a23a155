// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness wiring mock adapters over a temp SQLite database.

use std::sync::Arc;

use pixora_config::PixoraConfig;
use pixora_config::model::StorageConfig;
use pixora_core::types::{AuthUser, ModelRecord, UserProfile};
use pixora_core::{PixoraError, StorageAdapter};
use pixora_credits::{CreditLedger, Pricing};
use pixora_storage::SqliteStorage;

use crate::mock_provider::MockModelProvider;
use crate::mock_services::{MockEmail, MockIdentity, MockObjectStorage, MockPayment};

/// Signing secret configured on every harness.
pub const TEST_SIGNING_SECRET: &str = "whsec_cGl4b3JhLXRlc3Qtd2ViaG9vay1zaWduaW5nLWtleSE=";

/// Public base URL configured on every harness.
pub const TEST_SITE_URL: &str = "https://pixora.test";

pub struct TestHarnessBuilder {
    correlation_secret: Option<String>,
    signup_grant: Option<i64>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            correlation_secret: None,
            signup_grant: None,
        }
    }

    /// Enable signed correlation tokens in callback URLs.
    pub fn with_correlation_secret(mut self, secret: &str) -> Self {
        self.correlation_secret = Some(secret.to_string());
        self
    }

    pub fn with_signup_grant(mut self, credits: i64) -> Self {
        self.signup_grant = Some(credits);
        self
    }

    pub async fn build(self) -> Result<TestHarness, PixoraError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| PixoraError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db").to_string_lossy().to_string();

        let mut config = PixoraConfig::default();
        config.server.site_url = TEST_SITE_URL.to_string();
        config.storage = StorageConfig {
            database_path: db_path,
            wal_mode: true,
        };
        config.webhook.signing_secret = Some(TEST_SIGNING_SECRET.to_string());
        config.webhook.correlation_secret = self.correlation_secret;
        if let Some(grant) = self.signup_grant {
            config.credits.signup_grant = grant;
        }

        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        let ledger = CreditLedger::new(storage.database()?);

        Ok(TestHarness {
            pricing: Pricing::from_config(&config.credits),
            config,
            storage: Arc::new(storage),
            ledger,
            identity: Arc::new(MockIdentity::new()),
            objects: Arc::new(MockObjectStorage::new()),
            models: Arc::new(MockModelProvider::new()),
            email: Arc::new(MockEmail::new()),
            payment: Arc::new(MockPayment::new()),
            _temp_dir: temp_dir,
        })
    }
}

/// A complete back end with mock collaborators and a real, temporary datastore.
pub struct TestHarness {
    pub config: PixoraConfig,
    pub storage: Arc<SqliteStorage>,
    pub ledger: CreditLedger,
    pub pricing: Pricing,
    pub identity: Arc<MockIdentity>,
    pub objects: Arc<MockObjectStorage>,
    pub models: Arc<MockModelProvider>,
    pub email: Arc<MockEmail>,
    pub payment: Arc<MockPayment>,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// The datastore as the trait object services take.
    pub fn storage_adapter(&self) -> Arc<dyn StorageAdapter> {
        self.storage.clone()
    }

    /// Creates a user with `credits`, reachable with bearer token `token`.
    pub async fn add_user(
        &self,
        token: &str,
        user_id: &str,
        credits: i64,
    ) -> Result<UserProfile, PixoraError> {
        let user = AuthUser {
            id: user_id.to_string(),
            email: format!("{user_id}@example.com"),
            display_name: Some(format!("User {user_id}")),
        };
        self.identity.add_user(token, user.clone()).await;
        self.storage.ensure_profile(&user, credits).await
    }

    pub async fn balance(&self, user_id: &str) -> Result<i64, PixoraError> {
        self.ledger.balance(user_id).await
    }

    pub async fn model(
        &self,
        user_id: &str,
        model_name: &str,
    ) -> Result<Option<ModelRecord>, PixoraError> {
        self.storage.find_model(user_id, model_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builder_creates_working_environment() {
        let harness = TestHarness::builder().build().await.unwrap();
        let profile = harness.add_user("tok", "u1", 1000).await.unwrap();
        assert_eq!(profile.credits, 1000);
        assert_eq!(harness.balance("u1").await.unwrap(), 1000);
        assert!(harness.model("u1", "cats").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn temp_db_is_unique_per_harness() {
        let h1 = TestHarness::builder().build().await.unwrap();
        let h2 = TestHarness::builder().build().await.unwrap();
        h1.add_user("tok", "u1", 5).await.unwrap();
        assert!(h2.storage.get_profile("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn config_carries_test_secrets() {
        let harness = TestHarness::builder()
            .with_correlation_secret("corr")
            .with_signup_grant(25)
            .build()
            .await
            .unwrap();
        assert_eq!(
            harness.config.webhook.signing_secret.as_deref(),
            Some(TEST_SIGNING_SECRET)
        );
        assert_eq!(harness.config.webhook.correlation_secret.as_deref(), Some("corr"));
        assert_eq!(harness.config.credits.signup_grant, 25);
    }
}
