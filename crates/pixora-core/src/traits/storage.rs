// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for the relational datastore.

use async_trait::async_trait;

use crate::error::PixoraError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    AuthUser, GeneratedImage, ModelRecord, NewGeneratedImage, NewModelRecord, PendingOrder,
    StatusUpdate, TrainingStatus, UserProfile,
};

/// Adapter for the relational datastore behind profiles, models, images and orders.
///
/// Credit balance mutations do not go through this trait; they are owned by
/// the credit ledger, which needs transactional access to the same database.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), PixoraError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), PixoraError>;

    // --- Profiles ---

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, PixoraError>;

    /// Returns the profile for `user`, creating it with `initial_credits` if absent.
    async fn ensure_profile(
        &self,
        user: &AuthUser,
        initial_credits: i64,
    ) -> Result<UserProfile, PixoraError>;

    /// Sets the profile's display name. `None` when the profile does not exist.
    async fn update_display_name(
        &self,
        user_id: &str,
        display_name: &str,
    ) -> Result<Option<UserProfile>, PixoraError>;

    async fn increment_models_trained(&self, user_id: &str) -> Result<(), PixoraError>;

    async fn increment_images_generated(&self, user_id: &str, count: i64)
    -> Result<(), PixoraError>;

    // --- Models ---

    /// Inserts a model record and returns its row id.
    async fn insert_model(&self, record: &NewModelRecord) -> Result<i64, PixoraError>;

    async fn get_model(&self, id: i64) -> Result<Option<ModelRecord>, PixoraError>;

    /// Most recent model record for an owner and display name.
    async fn find_model(
        &self,
        user_id: &str,
        model_name: &str,
    ) -> Result<Option<ModelRecord>, PixoraError>;

    async fn list_models(&self, user_id: &str) -> Result<Vec<ModelRecord>, PixoraError>;

    /// Deletes an owner's model record. Returns whether a row was removed.
    async fn delete_model(&self, user_id: &str, id: i64) -> Result<bool, PixoraError>;

    /// Applies `update` only if the row's current status is one of `from`.
    ///
    /// Returns `false` when the row was not in an allowed state, which lets
    /// concurrent webhook deliveries race without regressing a record.
    async fn transition_model_status(
        &self,
        id: i64,
        from: &[TrainingStatus],
        update: &StatusUpdate,
    ) -> Result<bool, PixoraError>;

    // --- Generated images ---

    async fn insert_generated_image(&self, image: &NewGeneratedImage)
    -> Result<i64, PixoraError>;

    async fn list_generated_images(
        &self,
        user_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<GeneratedImage>, PixoraError>;

    /// Deletes an owner's image and returns the removed row.
    async fn delete_generated_image(
        &self,
        user_id: &str,
        id: i64,
    ) -> Result<Option<GeneratedImage>, PixoraError>;

    // --- Orders ---

    async fn insert_order(&self, order: &PendingOrder) -> Result<(), PixoraError>;

    async fn get_order(&self, order_id: &str) -> Result<Option<PendingOrder>, PixoraError>;

    async fn update_order_status(&self, order_id: &str, status: &str) -> Result<(), PixoraError>;
}
