// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Object storage adapter trait (training archives, generated images).

use async_trait::async_trait;

use crate::error::PixoraError;
use crate::traits::adapter::PluginAdapter;

/// Adapter for bucket-based object storage.
#[async_trait]
pub trait ObjectStorage: PluginAdapter {
    /// Issues a time-limited download URL for `path` inside `bucket`.
    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in_secs: u64,
    ) -> Result<String, PixoraError>;

    /// Stores `bytes` at `path` inside `bucket`. Fails if the object exists.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), PixoraError>;

    /// Removes objects. Removing an object that is already gone is not an error.
    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), PixoraError>;
}
