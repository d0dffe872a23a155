// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generated image metadata.

use pixora_core::PixoraError;
use pixora_core::types::{GeneratedImage, NewGeneratedImage};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

const IMAGE_COLUMNS: &str = "id, user_id, model_name, image_name, prompt, output_format,
    aspect_ratio, num_inference_steps, guidance, created_at";

fn row_to_image(row: &rusqlite::Row<'_>) -> rusqlite::Result<GeneratedImage> {
    Ok(GeneratedImage {
        id: row.get(0)?,
        user_id: row.get(1)?,
        model_name: row.get(2)?,
        image_name: row.get(3)?,
        prompt: row.get(4)?,
        output_format: row.get(5)?,
        aspect_ratio: row.get(6)?,
        num_inference_steps: row.get(7)?,
        guidance: row.get(8)?,
        created_at: row.get(9)?,
    })
}

/// Record one generated image and return its row id.
pub async fn insert_generated_image(
    db: &Database,
    image: &NewGeneratedImage,
) -> Result<i64, PixoraError> {
    let image = image.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO generated_images (user_id, model_name, image_name, prompt,
                    output_format, aspect_ratio, num_inference_steps, guidance)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    image.user_id,
                    image.model_name,
                    image.image_name,
                    image.prompt,
                    image.output_format,
                    image.aspect_ratio,
                    image.num_inference_steps,
                    image.guidance,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// An owner's images, newest first, optionally capped at `limit`.
pub async fn list_generated_images(
    db: &Database,
    user_id: &str,
    limit: Option<i64>,
) -> Result<Vec<GeneratedImage>, PixoraError> {
    let user_id = user_id.to_string();
    // SQLite treats a negative LIMIT as unbounded.
    let limit = limit.unwrap_or(-1);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {IMAGE_COLUMNS} FROM generated_images WHERE user_id = ?1
                 ORDER BY id DESC LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![user_id, limit], row_to_image)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Delete an owner's image and return the removed row.
/// Rows owned by someone else are left alone.
pub async fn delete_generated_image(
    db: &Database,
    user_id: &str,
    id: i64,
) -> Result<Option<GeneratedImage>, PixoraError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "DELETE FROM generated_images WHERE id = ?1 AND user_id = ?2
                     RETURNING {IMAGE_COLUMNS}"
                ),
                params![id, user_id],
                row_to_image,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}
