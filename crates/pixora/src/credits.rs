// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `pixora credits` command implementation.

use pixora_config::PixoraConfig;
use pixora_core::{PixoraError, StorageAdapter};
use pixora_credits::{CreditLedger, CreditReason};
use pixora_storage::SqliteStorage;

/// Add `amount` credits to `user_id` and return the new balance.
pub async fn run_grant(
    config: &PixoraConfig,
    user_id: &str,
    amount: i64,
) -> Result<i64, PixoraError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let ledger = CreditLedger::new(storage.database()?);

    let result = ledger
        .increment(user_id, amount, CreditReason::Grant, None)
        .await;
    storage.close().await?;
    result
}
