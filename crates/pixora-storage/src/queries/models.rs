// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model record CRUD and the conditional status transition.

use std::str::FromStr;

use pixora_core::PixoraError;
use pixora_core::types::{Hyperparameters, ModelRecord, NewModelRecord, StatusUpdate, TrainingStatus};
use rusqlite::types::{Type, Value};
use rusqlite::{OptionalExtension, params, params_from_iter};

use crate::database::{Database, map_tr_err};

const MODEL_COLUMNS: &str = "id, user_id, model_id, model_name, trigger_word, autocaption,
    autocaption_prefix, autocaption_suffix, training_steps, training_batch_size, learning_rate,
    lora_rank, resolution, caption_dropout_rate, optimizer, cache_latents_to_disk,
    layers_to_optimize_regex, gradient_checkpointing, training_id, training_status,
    training_time, model_version, created_at";

fn row_to_model(row: &rusqlite::Row<'_>) -> rusqlite::Result<ModelRecord> {
    let status: String = row.get(19)?;
    let training_status = TrainingStatus::from_str(&status)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(19, Type::Text, Box::new(e)))?;
    Ok(ModelRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        model_id: row.get(2)?,
        model_name: row.get(3)?,
        hyperparameters: Hyperparameters {
            trigger_word: row.get(4)?,
            autocaption: row.get(5)?,
            autocaption_prefix: row.get(6)?,
            autocaption_suffix: row.get(7)?,
            steps: row.get(8)?,
            batch_size: row.get(9)?,
            learning_rate: row.get(10)?,
            lora_rank: row.get(11)?,
            resolution: row.get(12)?,
            caption_dropout_rate: row.get(13)?,
            optimizer: row.get(14)?,
            cache_latents_to_disk: row.get(15)?,
            layers_to_optimize_regex: row.get(16)?,
            gradient_checkpointing: row.get(17)?,
        },
        training_id: row.get(18)?,
        training_status,
        training_time: row.get(20)?,
        model_version: row.get(21)?,
        created_at: row.get(22)?,
    })
}

/// Insert a model record and return its row id.
pub async fn insert_model(db: &Database, record: &NewModelRecord) -> Result<i64, PixoraError> {
    let r = record.clone();
    db.connection()
        .call(move |conn| {
            let hp = &r.hyperparameters;
            conn.execute(
                "INSERT INTO models (user_id, model_id, model_name, trigger_word, autocaption,
                    autocaption_prefix, autocaption_suffix, training_steps, training_batch_size,
                    learning_rate, lora_rank, resolution, caption_dropout_rate, optimizer,
                    cache_latents_to_disk, layers_to_optimize_regex, gradient_checkpointing,
                    training_id, training_status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                    ?17, ?18, ?19)",
                params![
                    r.user_id,
                    r.model_id,
                    r.model_name,
                    hp.trigger_word,
                    hp.autocaption,
                    hp.autocaption_prefix,
                    hp.autocaption_suffix,
                    hp.steps,
                    hp.batch_size,
                    hp.learning_rate,
                    hp.lora_rank,
                    hp.resolution,
                    hp.caption_dropout_rate,
                    hp.optimizer,
                    hp.cache_latents_to_disk,
                    hp.layers_to_optimize_regex,
                    hp.gradient_checkpointing,
                    r.training_id,
                    r.training_status.to_string(),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Most recent record for `(user_id, model_name)`.
///
/// A user may train the same display name more than once; the newest row is
/// the one a webhook for that name refers to.
pub async fn find_model(
    db: &Database,
    user_id: &str,
    model_name: &str,
) -> Result<Option<ModelRecord>, PixoraError> {
    let user_id = user_id.to_string();
    let model_name = model_name.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {MODEL_COLUMNS} FROM models
                     WHERE user_id = ?1 AND model_name = ?2
                     ORDER BY id DESC LIMIT 1"
                ),
                params![user_id, model_name],
                row_to_model,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// A model record by row id.
pub async fn get_model(db: &Database, id: i64) -> Result<Option<ModelRecord>, PixoraError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {MODEL_COLUMNS} FROM models WHERE id = ?1"),
                params![id],
                row_to_model,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// All of an owner's models, newest first.
pub async fn list_models(db: &Database, user_id: &str) -> Result<Vec<ModelRecord>, PixoraError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MODEL_COLUMNS} FROM models WHERE user_id = ?1 ORDER BY id DESC"
            ))?;
            let rows = stmt.query_map(params![user_id], row_to_model)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Delete an owner's model. Rows owned by someone else are left alone.
pub async fn delete_model(db: &Database, user_id: &str, id: i64) -> Result<bool, PixoraError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let removed = conn.execute(
                "DELETE FROM models WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
            )?;
            Ok(removed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Compare-and-set on `training_status`.
///
/// The row changes only when its current status is one of `from`.
/// `training_time` and `model_version` are written only when present.
pub async fn transition_model_status(
    db: &Database,
    id: i64,
    from: &[TrainingStatus],
    update: &StatusUpdate,
) -> Result<bool, PixoraError> {
    if from.is_empty() {
        return Ok(false);
    }

    let placeholders = (0..from.len())
        .map(|i| format!("?{}", i + 5))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE models
         SET training_status = ?1,
             training_time = COALESCE(?2, training_time),
             model_version = COALESCE(?3, model_version)
         WHERE id = ?4 AND training_status IN ({placeholders})"
    );

    let mut values = vec![
        Value::Text(update.status.to_string()),
        update.training_time.map_or(Value::Null, Value::Real),
        update
            .model_version
            .clone()
            .map_or(Value::Null, Value::Text),
        Value::Integer(id),
    ];
    values.extend(from.iter().map(|s| Value::Text(s.to_string())));

    db.connection()
        .call(move |conn| {
            let changed = conn.execute(&sql, params_from_iter(values.iter()))?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}
