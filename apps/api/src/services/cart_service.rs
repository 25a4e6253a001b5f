//! Cart service: the per-user cart store.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cart Operation Shape                              │
//! │                                                                         │
//! │  load cart ──► mutate in memory (boutik-core rules) ──► upsert row     │
//! │                                                                         │
//! │  The upsert is a single-row atomic replace. Two devices mutating the   │
//! │  same cart race as last-write-wins; that is an accepted limitation.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The stock check runs here, consistently, on every add: the post-merge
//! line quantity is checked against the availability computed for the
//! matching variant.

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ApiError;
use boutik_core::validation::validate_quantity;
use boutik_core::{Cart, CartLine, CoreError};
use boutik_db::Database;

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: String,
    /// Defaults to 1 when omitted.
    pub quantity: Option<i64>,
    pub size: Option<String>,
    pub color: Option<String>,
}

/// Bulk replacement payload: the full new set of lines.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceCartRequest {
    pub items: Vec<CartLine>,
}

// =============================================================================
// Service
// =============================================================================

/// Cart service implementation.
#[derive(Clone)]
pub struct CartService {
    db: Database,
}

impl CartService {
    /// Create a new cart service.
    pub fn new(db: Database) -> Self {
        CartService { db }
    }

    /// Returns the user's cart, persisting an empty one on first read.
    /// Idempotent: repeated reads yield the same empty cart.
    pub async fn get(&self, user_id: &str) -> Result<Cart, ApiError> {
        match self.db.carts().get(user_id).await? {
            Some(cart) => Ok(cart),
            None => {
                let cart = Cart::empty();
                self.db.carts().upsert(user_id, &cart).await?;
                Ok(cart)
            }
        }
    }

    /// Adds a product to the cart, merging into an existing line when the
    /// (product, size, color) variant matches.
    ///
    /// ## Errors
    /// - `NotFound` - unknown or inactive product
    /// - `InvalidInput` - non-positive or oversized quantity
    /// - `InsufficientStock` - post-merge quantity exceeds the
    ///   availability computed for the matching variant
    pub async fn add_item(&self, user_id: &str, req: AddToCartRequest) -> Result<Cart, ApiError> {
        let quantity = req.quantity.unwrap_or(1);
        validate_quantity(quantity)?;

        debug!(user_id = %user_id, product_id = %req.product_id, quantity, "Adding to cart");

        let product = self
            .db
            .products()
            .get_by_id(&req.product_id)
            .await?
            .filter(|p| p.active)
            .ok_or_else(|| ApiError::not_found("Product", &req.product_id))?;

        let mut cart = self.get(user_id).await?;

        // The line's would-be quantity after merging must fit in the
        // variant's availability.
        let requested =
            cart.quantity_of(&req.product_id, req.size.as_deref(), req.color.as_deref()) + quantity;
        let available = product
            .stock
            .units_for_variant(req.color.as_deref(), req.size.as_deref());
        if requested > available {
            return Err(CoreError::InsufficientStock {
                requested,
                available,
            }
            .into());
        }

        cart.add_line(CartLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            // Price snapshot: promo price when the promotion is active.
            unit_price: product.effective_price(),
            quantity,
            size: req.size,
            color: req.color,
        })
        .map_err(ApiError::from)?;

        self.db.carts().upsert(user_id, &cart).await?;

        info!(user_id = %user_id, product_id = %product.id, total = cart.total, "Cart item added");

        Ok(cart)
    }

    /// Sets the quantity of the line at `index`; zero or less removes it.
    pub async fn update_item(
        &self,
        user_id: &str,
        index: usize,
        quantity: i64,
    ) -> Result<Cart, ApiError> {
        let mut cart = self.get(user_id).await?;
        cart.update_line(index, quantity)?;
        self.db.carts().upsert(user_id, &cart).await?;
        Ok(cart)
    }

    /// Removes the line at `index`.
    pub async fn remove_item(&self, user_id: &str, index: usize) -> Result<Cart, ApiError> {
        let mut cart = self.get(user_id).await?;
        cart.remove_line(index)?;
        self.db.carts().upsert(user_id, &cart).await?;
        Ok(cart)
    }

    /// Empties the cart. Idempotent.
    pub async fn clear(&self, user_id: &str) -> Result<Cart, ApiError> {
        self.db.carts().clear(user_id).await?;
        Ok(Cart::empty())
    }

    /// Replaces the whole cart (bulk update). The total is recomputed from
    /// the supplied lines; stock is NOT re-validated, snapshots supplied
    /// here are the caller's responsibility.
    pub async fn replace(&self, user_id: &str, req: ReplaceCartRequest) -> Result<Cart, ApiError> {
        let mut cart = self.get(user_id).await?;
        cart.replace(req.items)?;
        self.db.carts().upsert(user_id, &cart).await?;
        Ok(cart)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::catalog_service::{CatalogService, ProductCreate};
    use boutik_db::DbConfig;
    use serde_json::json;

    async fn setup() -> (CartService, CatalogService) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        (CartService::new(db.clone()), CatalogService::new(db))
    }

    async fn seed_product(catalog: &CatalogService, stock: serde_json::Value) -> String {
        let created = catalog
            .create(ProductCreate {
                name: "Chemise Lin".to_string(),
                description: None,
                price: 6990,
                promo_price: None,
                category: "vetement".to_string(),
                subcategory: None,
                colors: vec!["Noir".to_string()],
                sizes: vec!["S".to_string(), "M".to_string()],
                images: vec![],
                stock: Some(stock),
            })
            .await
            .unwrap();
        created.product.id
    }

    fn add_req(product_id: &str, quantity: i64, size: &str, color: &str) -> AddToCartRequest {
        AddToCartRequest {
            product_id: product_id.to_string(),
            quantity: Some(quantity),
            size: Some(size.to_string()),
            color: Some(color.to_string()),
        }
    }

    #[tokio::test]
    async fn test_get_persists_empty_cart_idempotently() {
        let (carts, _) = setup().await;

        let first = carts.get("u1").await.unwrap();
        let second = carts.get("u1").await.unwrap();
        assert!(first.is_empty());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_add_merges_same_variant() {
        let (carts, catalog) = setup().await;
        let pid = seed_product(&catalog, json!({"Noir": {"S": 10, "M": 10}})).await;

        carts.add_item("u1", add_req(&pid, 2, "S", "Noir")).await.unwrap();
        let cart = carts.add_item("u1", add_req(&pid, 3, "S", "Noir")).await.unwrap();

        // One line with accumulated quantity, not two lines.
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 5);
        assert_eq!(cart.total, 5 * 6990);
    }

    #[tokio::test]
    async fn test_add_distinct_variants_appends() {
        let (carts, catalog) = setup().await;
        let pid = seed_product(&catalog, json!({"Noir": {"S": 10, "M": 10}})).await;

        carts.add_item("u1", add_req(&pid, 1, "S", "Noir")).await.unwrap();
        let cart = carts.add_item("u1", add_req(&pid, 1, "M", "Noir")).await.unwrap();

        assert_eq!(cart.items.len(), 2);
    }

    #[tokio::test]
    async fn test_add_enforces_variant_stock() {
        let (carts, catalog) = setup().await;
        let pid = seed_product(&catalog, json!({"Noir": {"S": 3, "M": 10}})).await;

        let err = carts
            .add_item("u1", add_req(&pid, 5, "S", "Noir"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        // The merge path is enforced too: 2 then 2 more exceeds 3.
        carts.add_item("u1", add_req(&pid, 2, "S", "Noir")).await.unwrap();
        let err = carts
            .add_item("u1", add_req(&pid, 2, "S", "Noir"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
    }

    #[tokio::test]
    async fn test_add_unknown_product_is_not_found() {
        let (carts, _) = setup().await;

        let err = carts
            .add_item("u1", add_req("missing", 1, "S", "Noir"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_add_inactive_product_is_not_found() {
        let (carts, catalog) = setup().await;
        let pid = seed_product(&catalog, json!({"Noir": {"S": 10}})).await;
        catalog.delete(&pid).await.unwrap();

        let err = carts
            .add_item("u1", add_req(&pid, 1, "S", "Noir"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_promo_price_is_snapshotted() {
        let (carts, catalog) = setup().await;
        let pid = seed_product(&catalog, json!({"Noir": {"S": 10}})).await;
        catalog
            .update(
                &pid,
                crate::services::catalog_service::ProductUpdate {
                    promo_price: Some(4990),
                    on_promotion: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let cart = carts.add_item("u1", add_req(&pid, 1, "S", "Noir")).await.unwrap();
        assert_eq!(cart.items[0].unit_price, 4990);
    }

    #[tokio::test]
    async fn test_update_and_remove_by_index() {
        let (carts, catalog) = setup().await;
        let pid = seed_product(&catalog, json!({"Noir": {"S": 10, "M": 10}})).await;

        carts.add_item("u1", add_req(&pid, 1, "S", "Noir")).await.unwrap();
        carts.add_item("u1", add_req(&pid, 1, "M", "Noir")).await.unwrap();

        let cart = carts.update_item("u1", 0, 4).await.unwrap();
        assert_eq!(cart.items[0].quantity, 4);
        assert_eq!(cart.total, cart.computed_total());

        let cart = carts.remove_item("u1", 1).await.unwrap();
        assert_eq!(cart.items.len(), 1);

        let err = carts.remove_item("u1", 7).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_clear_and_replace() {
        let (carts, catalog) = setup().await;
        let pid = seed_product(&catalog, json!({"Noir": {"S": 10}})).await;

        carts.add_item("u1", add_req(&pid, 1, "S", "Noir")).await.unwrap();
        let cart = carts.clear("u1").await.unwrap();
        assert!(cart.is_empty());

        let cart = carts
            .replace(
                "u1",
                ReplaceCartRequest {
                    items: vec![CartLine {
                        product_id: pid.clone(),
                        name: "Chemise Lin".to_string(),
                        unit_price: 6990,
                        quantity: 2,
                        size: Some("S".to_string()),
                        color: Some("Noir".to_string()),
                    }],
                },
            )
            .await
            .unwrap();
        assert_eq!(cart.total, 13980);
    }
}
