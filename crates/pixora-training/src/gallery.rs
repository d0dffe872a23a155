// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The owner's gallery of stored generated images.

use std::sync::Arc;

use pixora_core::types::GeneratedImage;
use pixora_core::{ObjectStorage, PixoraError, StorageAdapter};
use serde::Serialize;
use tracing::{info, warn};

/// A gallery entry with a time-limited download URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryImage {
    #[serde(flatten)]
    pub image: GeneratedImage,
    /// `None` when the object could not be signed.
    pub url: Option<String>,
}

pub struct ImageGallery {
    storage: Arc<dyn StorageAdapter>,
    object_storage: Arc<dyn ObjectStorage>,
    bucket: String,
    url_ttl_secs: u64,
}

impl ImageGallery {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        object_storage: Arc<dyn ObjectStorage>,
        bucket: String,
        url_ttl_secs: u64,
    ) -> Self {
        Self {
            storage,
            object_storage,
            bucket,
            url_ttl_secs,
        }
    }

    fn object_path(image: &GeneratedImage) -> String {
        format!("{}/{}", image.user_id, image.image_name)
    }

    /// The owner's images, newest first, each with a signed URL.
    pub async fn list(
        &self,
        user_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<GalleryImage>, PixoraError> {
        let images = self.storage.list_generated_images(user_id, limit).await?;
        let mut gallery = Vec::with_capacity(images.len());
        for image in images {
            let url = match self
                .object_storage
                .create_signed_url(&self.bucket, &Self::object_path(&image), self.url_ttl_secs)
                .await
            {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!(user_id, image_id = image.id, error = %e, "failed to sign image URL");
                    None
                }
            };
            gallery.push(GalleryImage { image, url });
        }
        Ok(gallery)
    }

    /// Delete one of the owner's images and its stored object.
    ///
    /// Another owner's image is reported as not found. A failed object
    /// removal is logged; the row is already gone.
    pub async fn delete(&self, user_id: &str, id: i64) -> Result<(), PixoraError> {
        let Some(image) = self.storage.delete_generated_image(user_id, id).await? else {
            return Err(PixoraError::NotFound(format!("image {id}")));
        };
        if let Err(e) = self
            .object_storage
            .remove(&self.bucket, &[Self::object_path(&image)])
            .await
        {
            warn!(user_id, image_id = id, error = %e, "failed to remove image object");
        }
        info!(user_id, image_id = id, "generated image deleted");
        Ok(())
    }
}
