//! # Cart Repository
//!
//! Database operations for the `carts` collection.
//!
//! One cart per user: `user_id` is the document key. The whole cart is
//! written back in a single upsert, which is the store's unit of atomic
//! replacement. Concurrent writers to the same cart are last-write-wins,
//! an accepted limitation, not a guaranteed ordering.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::{from_json, to_json};
use boutik_core::{Cart, CartLine};

/// Row shape of the `carts` table.
#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    items: String,
    total: i64,
}

/// Repository for cart database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Loads a user's cart.
    ///
    /// ## Returns
    /// * `Ok(Some(Cart))` - Cart document exists (possibly empty)
    /// * `Ok(None)` - User has never had a cart persisted
    pub async fn get(&self, user_id: &str) -> DbResult<Option<Cart>> {
        let row: Option<CartRow> =
            sqlx::query_as("SELECT items, total FROM carts WHERE user_id = ?1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(row) => {
                let items: Vec<CartLine> = from_json(&row.items)?;
                Ok(Some(Cart {
                    items,
                    total: row.total,
                }))
            }
            None => Ok(None),
        }
    }

    /// Writes a user's cart back in one atomic upsert.
    ///
    /// The single statement is the consistency boundary: a reader sees
    /// either the previous cart or the new one, never a half-written mix
    /// of lines and total.
    pub async fn upsert(&self, user_id: &str, cart: &Cart) -> DbResult<()> {
        debug!(user_id = %user_id, lines = cart.items.len(), total = cart.total, "Upserting cart");

        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO carts (user_id, items, total, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            ON CONFLICT(user_id) DO UPDATE SET
                items = excluded.items,
                total = excluded.total,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(to_json(&cart.items)?)
        .bind(cart.total)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Empties a user's cart (items = [], total = 0). Idempotent: clearing
    /// a missing or already-empty cart succeeds and persists the empty
    /// document.
    pub async fn clear(&self, user_id: &str) -> DbResult<()> {
        debug!(user_id = %user_id, "Clearing cart");
        self.upsert(user_id, &Cart::empty()).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn line(product_id: &str, price: i64, quantity: i64) -> CartLine {
        CartLine {
            product_id: product_id.to_string(),
            name: format!("Product {}", product_id),
            unit_price: price,
            quantity,
            size: None,
            color: None,
        }
    }

    #[tokio::test]
    async fn test_get_missing_cart_is_none() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.carts();

        assert!(repo.get("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.carts();

        let mut cart = Cart::empty();
        cart.add_line(line("p1", 2500, 2)).unwrap();
        repo.upsert("u1", &cart).await.unwrap();

        let loaded = repo.get("u1").await.unwrap().unwrap();
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(loaded.total, 5000);

        // Second upsert replaces, not appends.
        cart.add_line(line("p2", 1000, 1)).unwrap();
        repo.upsert("u1", &cart).await.unwrap();
        let loaded = repo.get("u1").await.unwrap().unwrap();
        assert_eq!(loaded.items.len(), 2);
        assert_eq!(loaded.total, 6000);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.carts();

        repo.clear("u1").await.unwrap();
        repo.clear("u1").await.unwrap();

        let loaded = repo.get("u1").await.unwrap().unwrap();
        assert!(loaded.is_empty());
        assert_eq!(loaded.total, 0);
    }
}
