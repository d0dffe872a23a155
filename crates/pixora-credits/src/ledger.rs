// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credit ledger over the `profiles.credits` column.
//!
//! Every movement is a single conditional `UPDATE ... RETURNING` plus an
//! audit row in `credit_transactions`, committed together. Two concurrent
//! debits from the same user can never take the balance below zero: the
//! floor is part of the `WHERE` clause and of a CHECK constraint.

use pixora_core::PixoraError;
use pixora_storage::{Database, map_tr_err};
use rusqlite::{OptionalExtension, params};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, info};

/// Why a balance moved.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CreditReason {
    Training,
    Generation,
    Purchase,
    Refund,
    Grant,
}

/// One row of the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditTransaction {
    pub id: i64,
    pub user_id: String,
    /// Signed change: negative for debits.
    pub delta: i64,
    pub balance_after: i64,
    pub reason: String,
    pub reference: Option<String>,
    pub created_at: String,
}

enum Movement {
    Applied(i64),
    AlreadyApplied(i64),
    Insufficient(i64),
    UnknownOwner,
}

/// Atomic credit balance operations.
#[derive(Clone)]
pub struct CreditLedger {
    db: Database,
}

impl CreditLedger {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Current balance of `user_id`.
    pub async fn balance(&self, user_id: &str) -> Result<i64, PixoraError> {
        let owner = user_id.to_string();
        let balance = self
            .db
            .connection()
            .call(move |conn| {
                conn.query_row(
                    "SELECT credits FROM profiles WHERE id = ?1",
                    params![owner],
                    |row| row.get::<_, i64>(0),
                )
                .optional()
            })
            .await
            .map_err(map_tr_err)?;
        balance.ok_or_else(|| PixoraError::NotFound(format!("profile {user_id}")))
    }

    /// Take `amount` credits from `user_id` and return the new balance.
    ///
    /// Fails with `InsufficientCredits` and leaves the balance untouched when
    /// the balance is lower than `amount`.
    pub async fn decrement(
        &self,
        user_id: &str,
        amount: i64,
        reason: CreditReason,
        reference: Option<&str>,
    ) -> Result<i64, PixoraError> {
        ensure_positive(amount)?;
        let owner = user_id.to_string();
        let reference = reference.map(str::to_string);
        let reason_str = reason.to_string();

        let movement = self
            .db
            .connection()
            .call(move |conn| {
                let tx = conn.transaction()?;
                let updated = tx
                    .query_row(
                        "UPDATE profiles SET credits = credits - ?2
                         WHERE id = ?1 AND credits >= ?2
                         RETURNING credits",
                        params![owner, amount],
                        |row| row.get::<_, i64>(0),
                    )
                    .optional()?;

                let Some(balance) = updated else {
                    let current = tx
                        .query_row(
                            "SELECT credits FROM profiles WHERE id = ?1",
                            params![owner],
                            |row| row.get::<_, i64>(0),
                        )
                        .optional()?;
                    return Ok(current.map_or(Movement::UnknownOwner, Movement::Insufficient));
                };

                tx.execute(
                    "INSERT INTO credit_transactions (user_id, delta, balance_after, reason, reference)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![owner, -amount, balance, reason_str, reference],
                )?;
                tx.commit()?;
                Ok(Movement::Applied(balance))
            })
            .await
            .map_err(map_tr_err)?;

        match movement {
            Movement::Applied(balance) | Movement::AlreadyApplied(balance) => {
                info!(user_id, amount, %reason, balance, "credits debited");
                Ok(balance)
            }
            Movement::Insufficient(available) => {
                debug!(user_id, amount, available, "debit refused");
                Err(PixoraError::InsufficientCredits {
                    required: amount,
                    available,
                })
            }
            Movement::UnknownOwner => Err(PixoraError::NotFound(format!("profile {user_id}"))),
        }
    }

    /// Add `amount` credits to `user_id` and return the new balance.
    ///
    /// With a `reference` that was already recorded, nothing changes and the
    /// current balance is returned, so crediting a captured order twice is safe.
    pub async fn increment(
        &self,
        user_id: &str,
        amount: i64,
        reason: CreditReason,
        reference: Option<&str>,
    ) -> Result<i64, PixoraError> {
        ensure_positive(amount)?;
        let owner = user_id.to_string();
        let reference_key = reference.map(str::to_string);
        let reason_str = reason.to_string();

        let movement = self
            .db
            .connection()
            .call(move |conn| {
                let reference = reference_key;
                let tx = conn.transaction()?;

                if let Some(reference) = &reference {
                    let seen = tx
                        .query_row(
                            "SELECT 1 FROM credit_transactions WHERE reference = ?1",
                            params![reference],
                            |_| Ok(()),
                        )
                        .optional()?;
                    if seen.is_some() {
                        let current = tx
                            .query_row(
                                "SELECT credits FROM profiles WHERE id = ?1",
                                params![owner],
                                |row| row.get::<_, i64>(0),
                            )
                            .optional()?;
                        return Ok(current.map_or(Movement::UnknownOwner, Movement::AlreadyApplied));
                    }
                }

                let updated = tx
                    .query_row(
                        "UPDATE profiles SET credits = credits + ?2 WHERE id = ?1 RETURNING credits",
                        params![owner, amount],
                        |row| row.get::<_, i64>(0),
                    )
                    .optional()?;
                let Some(balance) = updated else {
                    return Ok(Movement::UnknownOwner);
                };

                tx.execute(
                    "INSERT INTO credit_transactions (user_id, delta, balance_after, reason, reference)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![owner, amount, balance, reason_str, reference],
                )?;
                tx.commit()?;
                Ok(Movement::Applied(balance))
            })
            .await
            .map_err(map_tr_err)?;

        match movement {
            Movement::Applied(balance) => {
                info!(user_id, amount, %reason, balance, "credits added");
                Ok(balance)
            }
            Movement::AlreadyApplied(balance) => {
                debug!(user_id, ?reference, "credit reference already recorded");
                Ok(balance)
            }
            Movement::Insufficient(_) | Movement::UnknownOwner => {
                Err(PixoraError::NotFound(format!("profile {user_id}")))
            }
        }
    }

    /// An owner's ledger history, newest first.
    pub async fn transactions(&self, user_id: &str) -> Result<Vec<CreditTransaction>, PixoraError> {
        let owner = user_id.to_string();
        self.db
            .connection()
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, user_id, delta, balance_after, reason, reference, created_at
                     FROM credit_transactions WHERE user_id = ?1 ORDER BY id DESC",
                )?;
                let rows = stmt.query_map(params![owner], |row| {
                    Ok(CreditTransaction {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        delta: row.get(2)?,
                        balance_after: row.get(3)?,
                        reason: row.get(4)?,
                        reference: row.get(5)?,
                        created_at: row.get(6)?,
                    })
                })?;
                rows.collect::<Result<Vec<_>, _>>()
            })
            .await
            .map_err(map_tr_err)
    }
}

fn ensure_positive(amount: i64) -> Result<(), PixoraError> {
    if amount <= 0 {
        return Err(PixoraError::Validation(format!(
            "credit amount must be positive, got {amount}"
        )));
    }
    Ok(())
}
