//! # Order Repository
//!
//! Database operations for the `orders` collection.
//!
//! ## Commit Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Checkout Write Ordering                               │
//! │                                                                         │
//! │  1. INSERT order  ──► unique index on order_number; a collision        │
//! │                       surfaces as UniqueViolation and the service      │
//! │                       retries with a fresh number                      │
//! │  2. clear cart    ──► only after the insert succeeded                  │
//! │                                                                         │
//! │  order-created-but-cart-not-cleared is a tolerable transient state     │
//! │  (a stale cart is merely redundant). The inverse (cart cleared with    │
//! │  no order) would lose the customer's submission and must never occur.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Orders are immutable after insert except for `status`,
//! `payment_status` and `updated_at`.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{from_json, to_json};
use boutik_core::{
    Order, OrderItem, OrderStatus, PaymentInfo, PaymentMethod, PaymentStatus, ShippingInfo,
};

/// Row shape of the `orders` table.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    order_number: String,
    user_id: String,
    items: String,
    subtotal: i64,
    shipping_cost: i64,
    total: i64,
    status: OrderStatus,
    shipping: String,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self) -> DbResult<Order> {
        let items: Vec<OrderItem> = from_json(&self.items)?;
        let shipping: ShippingInfo = from_json(&self.shipping)?;

        Ok(Order {
            id: self.id,
            order_number: self.order_number,
            user_id: self.user_id,
            items,
            subtotal: self.subtotal,
            shipping_cost: self.shipping_cost,
            total: self.total,
            status: self.status,
            shipping,
            payment: PaymentInfo {
                method: self.payment_method,
                status: self.payment_status,
            },
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_COLUMNS: &str = "SELECT id, order_number, user_id, items, subtotal, \
     shipping_cost, total, status, shipping, payment_method, payment_status, \
     notes, created_at, updated_at FROM orders";

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts a committed order.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - order_number collision; the
    ///   caller retries with a freshly generated number
    pub async fn insert(&self, order: &Order) -> DbResult<()> {
        debug!(id = %order.id, order_number = %order.order_number, "Inserting order");

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, user_id, items,
                subtotal, shipping_cost, total,
                status, shipping, payment_method, payment_status,
                notes, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7,
                ?8, ?9, ?10, ?11,
                ?12, ?13, ?14
            )
            "#,
        )
        .bind(&order.id)
        .bind(&order.order_number)
        .bind(&order.user_id)
        .bind(to_json(&order.items)?)
        .bind(order.subtotal)
        .bind(order.shipping_cost)
        .bind(order.total)
        .bind(order.status)
        .bind(to_json(&order.shipping)?)
        .bind(order.payment.method)
        .bind(order.payment.status)
        .bind(&order.notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets an order by its id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(&format!("{} WHERE id = ?1", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(OrderRow::into_order).transpose()
    }

    /// Lists a user's orders, newest first, with skip/limit.
    pub async fn list_for_user(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "{} WHERE user_id = ?1 ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
            SELECT_COLUMNS
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(OrderRow::into_order).collect()
    }

    /// Lists all orders (admin view), newest first, with skip/limit.
    pub async fn list_all(&self, limit: i64, offset: i64) -> DbResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "{} ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
            SELECT_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(OrderRow::into_order).collect()
    }

    /// Sets an order's lifecycle status.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Order doesn't exist
    pub async fn set_status(&self, id: &str, status: OrderStatus) -> DbResult<()> {
        debug!(id = %id, status = %status, "Setting order status");

        let result =
            sqlx::query("UPDATE orders SET status = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(status)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        Ok(())
    }

    /// Sets an order's payment status.
    pub async fn set_payment_status(&self, id: &str, status: PaymentStatus) -> DbResult<()> {
        debug!(id = %id, "Setting order payment status");

        let result =
            sqlx::query("UPDATE orders SET payment_status = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(status)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        Ok(())
    }

    /// Counts all orders (for the admin dashboard).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Total revenue: the sum of all order totals (for the admin
    /// dashboard).
    pub async fn revenue(&self) -> DbResult<i64> {
        let revenue: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(total), 0) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        Ok(revenue)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
