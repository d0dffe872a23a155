// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use pixora_config::model::StorageConfig;
use pixora_core::types::{
    AuthUser, GeneratedImage, ModelRecord, NewGeneratedImage, NewModelRecord, PendingOrder,
    StatusUpdate, TrainingStatus, UserProfile,
};
use pixora_core::{AdapterType, HealthStatus, PixoraError, PluginAdapter, StorageAdapter};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed storage adapter.
///
/// The database is opened lazily by [`StorageAdapter::initialize`]; every
/// other call fails until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Wrap an already opened database, e.g. an in-memory one in tests.
    pub fn from_database(db: Database) -> Self {
        Self {
            config: StorageConfig {
                database_path: ":memory:".to_string(),
                wal_mode: false,
            },
            db: OnceCell::new_with(Some(db)),
        }
    }

    /// A handle to the same database, for components that need their own
    /// transactions (the credit ledger).
    pub fn database(&self) -> Result<Database, PixoraError> {
        self.db().cloned()
    }

    fn db(&self) -> Result<&Database, PixoraError> {
        self.db.get().ok_or_else(|| PixoraError::Storage {
            source: "storage not initialized, call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, PixoraError> {
        self.db()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PixoraError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), PixoraError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| PixoraError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), PixoraError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, PixoraError> {
        queries::profiles::get_profile(self.db()?, user_id).await
    }

    async fn ensure_profile(
        &self,
        user: &AuthUser,
        initial_credits: i64,
    ) -> Result<UserProfile, PixoraError> {
        queries::profiles::ensure_profile(self.db()?, user, initial_credits).await
    }

    async fn update_display_name(
        &self,
        user_id: &str,
        display_name: &str,
    ) -> Result<Option<UserProfile>, PixoraError> {
        queries::profiles::update_display_name(self.db()?, user_id, display_name).await
    }

    async fn increment_models_trained(&self, user_id: &str) -> Result<(), PixoraError> {
        queries::profiles::increment_models_trained(self.db()?, user_id).await
    }

    async fn increment_images_generated(
        &self,
        user_id: &str,
        count: i64,
    ) -> Result<(), PixoraError> {
        queries::profiles::increment_images_generated(self.db()?, user_id, count).await
    }

    async fn insert_model(&self, record: &NewModelRecord) -> Result<i64, PixoraError> {
        queries::models::insert_model(self.db()?, record).await
    }

    async fn get_model(&self, id: i64) -> Result<Option<ModelRecord>, PixoraError> {
        queries::models::get_model(self.db()?, id).await
    }

    async fn find_model(
        &self,
        user_id: &str,
        model_name: &str,
    ) -> Result<Option<ModelRecord>, PixoraError> {
        queries::models::find_model(self.db()?, user_id, model_name).await
    }

    async fn list_models(&self, user_id: &str) -> Result<Vec<ModelRecord>, PixoraError> {
        queries::models::list_models(self.db()?, user_id).await
    }

    async fn delete_model(&self, user_id: &str, id: i64) -> Result<bool, PixoraError> {
        queries::models::delete_model(self.db()?, user_id, id).await
    }

    async fn transition_model_status(
        &self,
        id: i64,
        from: &[TrainingStatus],
        update: &StatusUpdate,
    ) -> Result<bool, PixoraError> {
        queries::models::transition_model_status(self.db()?, id, from, update).await
    }

    async fn insert_generated_image(
        &self,
        image: &NewGeneratedImage,
    ) -> Result<i64, PixoraError> {
        queries::images::insert_generated_image(self.db()?, image).await
    }

    async fn list_generated_images(
        &self,
        user_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<GeneratedImage>, PixoraError> {
        queries::images::list_generated_images(self.db()?, user_id, limit).await
    }

    async fn delete_generated_image(
        &self,
        user_id: &str,
        id: i64,
    ) -> Result<Option<GeneratedImage>, PixoraError> {
        queries::images::delete_generated_image(self.db()?, user_id, id).await
    }

    async fn insert_order(&self, order: &PendingOrder) -> Result<(), PixoraError> {
        queries::orders::insert_order(self.db()?, order).await
    }

    async fn get_order(&self, order_id: &str) -> Result<Option<PendingOrder>, PixoraError> {
        queries::orders::get_order(self.db()?, order_id).await
    }

    async fn update_order_status(&self, order_id: &str, status: &str) -> Result<(), PixoraError> {
        queries::orders::update_order_status(self.db()?, order_id, status).await
    }
}
