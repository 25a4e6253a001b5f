//! Order service: checkout, queries, cancellation, admin transitions.
//!
//! ## Checkout Consistency
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Two-Step Commit (no transaction)                      │
//! │                                                                         │
//! │  1. Load cart ── empty? ──► EmptyCart, nothing written                  │
//! │  2. Build order snapshot (frozen lines, recomputed subtotal)            │
//! │  3. INSERT order ── number collision? ──► regenerate, retry (bounded)   │
//! │  4. Clear cart ── only AFTER the insert succeeded                       │
//! │                                                                         │
//! │  If step 4 fails the order is still returned: a stale cart is merely   │
//! │  redundant and repairs itself on the next mutation. The inverse        │
//! │  (cart cleared, no order) would lose the customer's submission and     │
//! │  is impossible by construction; the clear never precedes the insert.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock is NOT decremented on commit in this version; see DESIGN.md.

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::ApiError;
use boutik_core::order::{
    build_order, generate_order_number, parse_admin_status, validate_user_cancel,
    ORDER_NUMBER_ATTEMPTS,
};
use boutik_core::{Order, OrderStatus, PaymentMethod, PaymentStatus, ShippingInfo, User};
use boutik_db::Database;

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub shipping: ShippingInfo,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    /// Shipping cost in francs.
    #[serde(default)]
    pub shipping_cost: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderListQuery {
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// Service
// =============================================================================

/// Order service implementation.
#[derive(Clone)]
pub struct OrderService {
    db: Database,
}

impl OrderService {
    /// Create a new order service.
    pub fn new(db: Database) -> Self {
        OrderService { db }
    }

    /// Commits the user's cart into an immutable order and clears the cart.
    ///
    /// ## Errors
    /// - `EmptyCart` - no lines to commit (no writes performed)
    /// - `Conflict` - order-number collisions exhausted the retry budget
    pub async fn checkout(&self, user_id: &str, req: CheckoutRequest) -> Result<Order, ApiError> {
        let cart = self.db.carts().get(user_id).await?.unwrap_or_default();

        // The cart's snapshotted prices are authoritative; build_order
        // recomputes the subtotal from the frozen lines.
        let mut order = build_order(
            user_id,
            &cart,
            req.shipping,
            req.payment_method,
            req.shipping_cost,
            req.notes,
        )?;

        let mut attempt = 1;
        loop {
            match self.db.orders().insert(&order).await {
                Ok(()) => break,
                Err(err) if err.is_unique_violation() => {
                    if attempt >= ORDER_NUMBER_ATTEMPTS {
                        warn!(user_id = %user_id, attempts = attempt, "Order number collisions exhausted retries");
                        return Err(ApiError::conflict(
                            "Could not allocate a unique order number",
                        ));
                    }
                    attempt += 1;
                    order.order_number = generate_order_number();
                }
                Err(err) => return Err(err.into()),
            }
        }

        // The cart is cleared only now that the order exists. A failed
        // clear leaves a stale cart, which is tolerable and self-repairing;
        // the order must still be returned to the customer.
        if let Err(err) = self.db.carts().clear(user_id).await {
            warn!(
                user_id = %user_id,
                order_id = %order.id,
                error = %err,
                "Order created but cart clear failed; stale cart left behind"
            );
        }

        info!(
            user_id = %user_id,
            order_id = %order.id,
            order_number = %order.order_number,
            total = order.total,
            "Order committed"
        );

        Ok(order)
    }

    /// Lists the user's own orders, newest first.
    pub async fn list_for_user(
        &self,
        user_id: &str,
        query: OrderListQuery,
    ) -> Result<Vec<Order>, ApiError> {
        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let skip = query.skip.unwrap_or(0).max(0);

        Ok(self.db.orders().list_for_user(user_id, limit, skip).await?)
    }

    /// Gets one order. Owners see their own orders; admins see any.
    /// Anyone else gets `NotFound`; existence is not leaked.
    pub async fn get(&self, order_id: &str, requester: &User) -> Result<Order, ApiError> {
        let order = self
            .db
            .orders()
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Order", order_id))?;

        if order.user_id != requester.id && !requester.is_admin() {
            return Err(ApiError::not_found("Order", order_id));
        }

        Ok(order)
    }

    /// Cancels an order as its owning user.
    ///
    /// ## Errors
    /// - `Forbidden` - requester is not the owner
    /// - `InvalidTransition` - order is no longer `pending`
    pub async fn cancel(&self, order_id: &str, user_id: &str) -> Result<Order, ApiError> {
        let order = self
            .db
            .orders()
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Order", order_id))?;

        validate_user_cancel(&order, user_id)?;

        self.db
            .orders()
            .set_status(order_id, OrderStatus::Cancelled)
            .await?;

        info!(order_id = %order_id, user_id = %user_id, "Order cancelled by owner");

        self.reload(order_id).await
    }

    /// Lists all orders (admin view).
    pub async fn admin_list(&self, query: OrderListQuery) -> Result<Vec<Order>, ApiError> {
        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let skip = query.skip.unwrap_or(0).max(0);

        Ok(self.db.orders().list_all(limit, skip).await?)
    }

    /// Forces an order's status (admin).
    ///
    /// Unknown status strings are `InvalidInput` and leave the order
    /// unchanged. There is no other transition guard on this path:
    /// intentional operational flexibility, including forced cancellation
    /// from any state.
    pub async fn admin_set_status(&self, order_id: &str, raw: &str) -> Result<Order, ApiError> {
        let status = parse_admin_status(raw)?;

        self.db.orders().set_status(order_id, status).await?;

        info!(order_id = %order_id, status = %status, "Order status set by admin");

        self.reload(order_id).await
    }

    /// Sets an order's payment status (admin).
    pub async fn admin_set_payment_status(
        &self,
        order_id: &str,
        raw: &str,
    ) -> Result<Order, ApiError> {
        let status = parse_payment_status(raw)?;

        self.db.orders().set_payment_status(order_id, status).await?;

        info!(order_id = %order_id, "Order payment status set by admin");

        self.reload(order_id).await
    }

    async fn reload(&self, order_id: &str) -> Result<Order, ApiError> {
        self.db
            .orders()
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Order", order_id))
    }
}

fn parse_payment_status(raw: &str) -> Result<PaymentStatus, ApiError> {
    match raw {
        "pending" => Ok(PaymentStatus::Pending),
        "paid" => Ok(PaymentStatus::Paid),
        "failed" => Ok(PaymentStatus::Failed),
        "refunded" => Ok(PaymentStatus::Refunded),
        other => Err(ApiError::invalid_input(format!(
            "unknown payment status: {}",
            other
        ))),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::cart_service::{AddToCartRequest, CartService};
    use crate::services::catalog_service::{CatalogService, ProductCreate};
    use boutik_core::Role;
    use boutik_db::DbConfig;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    struct Fixture {
        db: Database,
        orders: OrderService,
        carts: CartService,
    }

    async fn setup() -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        Fixture {
            orders: OrderService::new(db.clone()),
            carts: CartService::new(db.clone()),
            db,
        }
    }

    async fn seed_cart(fixture: &Fixture, user_id: &str) {
        let catalog = CatalogService::new(fixture.db.clone());
        let created = catalog
            .create(ProductCreate {
                name: "Parfum Marasi".to_string(),
                description: None,
                price: 10000,
                promo_price: None,
                category: "parfum".to_string(),
                subcategory: Some("50ml".to_string()),
                colors: vec![],
                sizes: vec![],
                images: vec![],
                stock: Some(json!({"50ml": 50})),
            })
            .await
            .unwrap();

        fixture
            .carts
            .add_item(
                user_id,
                AddToCartRequest {
                    product_id: created.product.id,
                    quantity: Some(2),
                    size: Some("50ml".to_string()),
                    color: None,
                },
            )
            .await
            .unwrap();
    }

    fn checkout_req() -> CheckoutRequest {
        CheckoutRequest {
            shipping: ShippingInfo {
                recipient: "Awa Diop".to_string(),
                phone: "771234567".to_string(),
                address: "Rue 10".to_string(),
                city: "Dakar".to_string(),
                method: "standard".to_string(),
            },
            payment_method: PaymentMethod::Wave,
            shipping_cost: 1500,
            notes: None,
        }
    }

    fn user(id: &str, role: Role) -> User {
        let now = Utc::now();
        User {
            id: id.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            phone: format!("77{:07}", 0),
            password_hash: String::new(),
            role,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_checkout_empty_cart_fails_without_writes() {
        let fixture = setup().await;

        let err = fixture.orders.checkout("u1", checkout_req()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptyCart);

        // No order row was written.
        assert_eq!(fixture.db.orders().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_checkout_snapshots_and_clears_cart() {
        let fixture = setup().await;
        seed_cart(&fixture, "u1").await;

        let cart_before = fixture.carts.get("u1").await.unwrap();
        let order = fixture.orders.checkout("u1", checkout_req()).await.unwrap();

        assert_eq!(order.subtotal, cart_before.total);
        assert_eq!(order.total, order.subtotal + 1500);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment.status, PaymentStatus::Pending);
        assert!(order.order_number.starts_with("CMD-"));

        // Exactly one order; the cart is empty afterwards.
        assert_eq!(fixture.db.orders().count().await.unwrap(), 1);
        assert!(fixture.carts.get("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sequential_checkouts_get_distinct_numbers() {
        let fixture = setup().await;

        seed_cart(&fixture, "u1").await;
        let first = fixture.orders.checkout("u1", checkout_req()).await.unwrap();

        seed_cart(&fixture, "u1").await;
        let second = fixture.orders.checkout("u1", checkout_req()).await.unwrap();

        assert_ne!(first.order_number, second.order_number);
        assert_eq!(fixture.db.orders().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_owner_cancels_pending_order() {
        let fixture = setup().await;
        seed_cart(&fixture, "u1").await;
        let order = fixture.orders.checkout("u1", checkout_req()).await.unwrap();

        let cancelled = fixture.orders.cancel(&order.id, "u1").await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_non_owner_cancel_is_forbidden() {
        let fixture = setup().await;
        seed_cart(&fixture, "u1").await;
        let order = fixture.orders.checkout("u1", checkout_req()).await.unwrap();

        let err = fixture.orders.cancel(&order.id, "u2").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn test_cancel_shipped_is_invalid_transition() {
        let fixture = setup().await;
        seed_cart(&fixture, "u1").await;
        let order = fixture.orders.checkout("u1", checkout_req()).await.unwrap();

        fixture
            .orders
            .admin_set_status(&order.id, "shipped")
            .await
            .unwrap();

        let err = fixture.orders.cancel(&order.id, "u1").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);
    }

    #[tokio::test]
    async fn test_admin_set_unknown_status_leaves_order_unchanged() {
        let fixture = setup().await;
        seed_cart(&fixture, "u1").await;
        let order = fixture.orders.checkout("u1", checkout_req()).await.unwrap();

        let err = fixture
            .orders
            .admin_set_status(&order.id, "teleported")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);

        let admin = user("a1", Role::Admin);
        let loaded = fixture.orders.get(&order.id, &admin).await.unwrap();
        assert_eq!(loaded.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_admin_may_force_any_transition() {
        let fixture = setup().await;
        seed_cart(&fixture, "u1").await;
        let order = fixture.orders.checkout("u1", checkout_req()).await.unwrap();

        // Forward, backward, and forced cancellation are all allowed on
        // the admin path.
        fixture.orders.admin_set_status(&order.id, "delivered").await.unwrap();
        fixture.orders.admin_set_status(&order.id, "processing").await.unwrap();
        let cancelled = fixture
            .orders
            .admin_set_status(&order.id, "cancelled")
            .await
            .unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_get_scopes_to_owner_or_admin() {
        let fixture = setup().await;
        seed_cart(&fixture, "u1").await;
        let order = fixture.orders.checkout("u1", checkout_req()).await.unwrap();

        let owner = user("u1", Role::User);
        let stranger = user("u2", Role::User);
        let admin = user("a1", Role::Admin);

        assert!(fixture.orders.get(&order.id, &owner).await.is_ok());
        assert!(fixture.orders.get(&order.id, &admin).await.is_ok());

        let err = fixture.orders.get(&order.id, &stranger).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_admin_sets_payment_status() {
        let fixture = setup().await;
        seed_cart(&fixture, "u1").await;
        let order = fixture.orders.checkout("u1", checkout_req()).await.unwrap();

        let updated = fixture
            .orders
            .admin_set_payment_status(&order.id, "paid")
            .await
            .unwrap();
        assert_eq!(updated.payment.status, PaymentStatus::Paid);

        let err = fixture
            .orders
            .admin_set_payment_status(&order.id, "maybe")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }
}
