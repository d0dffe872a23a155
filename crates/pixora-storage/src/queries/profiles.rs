// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Profile rows. Credits are read here but only the ledger writes them.

use pixora_core::PixoraError;
use pixora_core::types::{AuthUser, UserProfile};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

const PROFILE_COLUMNS: &str =
    "id, email, display_name, credits, models_trained, images_generated, created_at";

fn row_to_profile(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        id: row.get(0)?,
        email: row.get(1)?,
        display_name: row.get(2)?,
        credits: row.get(3)?,
        models_trained: row.get(4)?,
        images_generated: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Get a profile by user id.
pub async fn get_profile(db: &Database, user_id: &str) -> Result<Option<UserProfile>, PixoraError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?1"),
                params![user_id],
                row_to_profile,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Insert the profile if it does not exist, then return the stored row.
///
/// An existing profile keeps its balance; `initial_credits` applies only on
/// creation, and the grant is written to the credit log in the same transaction.
pub async fn ensure_profile(
    db: &Database,
    user: &AuthUser,
    initial_credits: i64,
) -> Result<UserProfile, PixoraError> {
    let user = user.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let inserted = tx.execute(
                "INSERT INTO profiles (id, email, display_name, credits)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO NOTHING",
                params![user.id, user.email, user.display_name, initial_credits],
            )?;
            if inserted == 1 && initial_credits > 0 {
                tx.execute(
                    "INSERT INTO credit_transactions (user_id, delta, balance_after, reason)
                     VALUES (?1, ?2, ?2, 'grant')",
                    params![user.id, initial_credits],
                )?;
            }
            let profile = tx.query_row(
                &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?1"),
                params![user.id],
                row_to_profile,
            )?;
            tx.commit()?;
            Ok(profile)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn increment_models_trained(db: &Database, user_id: &str) -> Result<(), PixoraError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE profiles SET models_trained = models_trained + 1 WHERE id = ?1",
                params![user_id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn increment_images_generated(
    db: &Database,
    user_id: &str,
    count: i64,
) -> Result<(), PixoraError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE profiles SET images_generated = images_generated + ?2 WHERE id = ?1",
                params![user_id, count],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Set the display name and return the updated profile, `None` if absent.
pub async fn update_display_name(
    db: &Database,
    user_id: &str,
    display_name: &str,
) -> Result<Option<UserProfile>, PixoraError> {
    let user_id = user_id.to_string();
    let display_name = display_name.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "UPDATE profiles SET display_name = ?2 WHERE id = ?1
                     RETURNING {PROFILE_COLUMNS}"
                ),
                params![user_id, display_name],
                row_to_profile,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}
