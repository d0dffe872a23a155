// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pending payment orders, remembered between create and capture.

use pixora_core::PixoraError;
use pixora_core::types::PendingOrder;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

pub async fn insert_order(db: &Database, order: &PendingOrder) -> Result<(), PixoraError> {
    let order = order.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO orders (order_id, user_id, pack_id, status) VALUES (?1, ?2, ?3, ?4)",
                params![order.order_id, order.user_id, order.pack_id, order.status],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_order(db: &Database, order_id: &str) -> Result<Option<PendingOrder>, PixoraError> {
    let order_id = order_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT order_id, user_id, pack_id, status, created_at
                 FROM orders WHERE order_id = ?1",
                params![order_id],
                |row| {
                    Ok(PendingOrder {
                        order_id: row.get(0)?,
                        user_id: row.get(1)?,
                        pack_id: row.get(2)?,
                        status: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn update_order_status(
    db: &Database,
    order_id: &str,
    status: &str,
) -> Result<(), PixoraError> {
    let order_id = order_id.to_string();
    let status = status.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE orders SET status = ?2 WHERE order_id = ?1",
                params![order_id, status],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use pixora_core::types::AuthUser;

    use super::*;
    use crate::queries::profiles;

    #[tokio::test]
    async fn order_lifecycle() {
        let db = Database::open_in_memory().await.unwrap();
        let user = AuthUser {
            id: "u1".into(),
            email: "u1@example.com".into(),
            display_name: None,
        };
        profiles::ensure_profile(&db, &user, 0).await.unwrap();

        let order = PendingOrder {
            order_id: "5O190127TN364715T".into(),
            user_id: "u1".into(),
            pack_id: "creator".into(),
            status: "CREATED".into(),
            created_at: String::new(),
        };
        insert_order(&db, &order).await.unwrap();
        update_order_status(&db, &order.order_id, "COMPLETED").await.unwrap();

        let stored = get_order(&db, &order.order_id).await.unwrap().unwrap();
        assert_eq!(stored.pack_id, "creator");
        assert_eq!(stored.status, "COMPLETED");
        assert!(!stored.created_at.is_empty());
        assert!(get_order(&db, "missing").await.unwrap().is_none());
    }
}
