//! Catalog service: product listings, lookups, and admin mutations.
//!
//! Listings only ever show active products; soft-deleted ones stay
//! reachable by id so order history keeps resolving. The polymorphic
//! stock document is replaced wholesale on admin updates; there is no
//! partial merge.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::ApiError;
use boutik_core::stock::has_negative_leaf;
use boutik_core::validation::{slugify, validate_name, validate_price};
use boutik_core::{Product, Stock};
use boutik_db::{generate_product_id, Database, ProductFilter};

// =============================================================================
// DTOs
// =============================================================================

/// Query parameters for product listings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductListQuery {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub search: Option<String>,
    pub featured: Option<bool>,
    pub promotion: Option<bool>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// A product as returned by the API: the stored fields plus the derived
/// `stockTotal` / `inStock` figures (derived at read time, never stored).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    #[serde(flatten)]
    pub product: Product,
    pub stock_total: i64,
    pub in_stock: bool,
}

impl From<Product> for ProductDto {
    fn from(product: Product) -> Self {
        let availability = product.availability();
        ProductDto {
            product,
            stock_total: availability.total_units,
            in_stock: availability.in_stock,
        }
    }
}

/// A paginated product listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListResponse {
    pub data: Vec<ProductDto>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
}

/// Admin payload for creating a product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreate {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub promo_price: Option<i64>,
    pub category: String,
    pub subcategory: Option<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    /// Raw stock document; when absent a zeroed structure is scaffolded
    /// from colors/sizes.
    pub stock: Option<Value>,
}

/// Admin payload for a partial product update. `None` fields are left
/// untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub promo_price: Option<i64>,
    pub on_promotion: Option<bool>,
    pub featured: Option<bool>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub colors: Option<Vec<String>>,
    pub sizes: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
    pub stock: Option<Value>,
    pub active: Option<bool>,
}

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 2000;

// =============================================================================
// Service
// =============================================================================

/// Catalog service implementation.
#[derive(Clone)]
pub struct CatalogService {
    db: Database,
}

impl CatalogService {
    /// Create a new catalog service.
    pub fn new(db: Database) -> Self {
        CatalogService { db }
    }

    /// Lists active products matching the query, newest first, paginated.
    pub async fn list(&self, query: ProductListQuery) -> Result<ProductListResponse, ApiError> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let offset = (page - 1) * limit;

        let filter = ProductFilter {
            category: query.category,
            subcategory: query.subcategory,
            search: query.search,
            featured: query.featured,
            promotion: query.promotion,
        };

        let products = self.db.products().list(&filter, limit, offset).await?;
        let total = self.db.products().count(&filter).await?;

        Ok(ProductListResponse {
            data: products.into_iter().map(ProductDto::from).collect(),
            total,
            page,
            limit,
            pages: (total + limit - 1) / limit,
        })
    }

    /// Gets a product by id, active or not (direct links and order
    /// history must keep resolving).
    pub async fn get(&self, id: &str) -> Result<ProductDto, ApiError> {
        let product = self
            .db
            .products()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Product", id))?;

        Ok(product.into())
    }

    /// Lists featured products.
    pub async fn featured(&self, limit: i64) -> Result<Vec<ProductDto>, ApiError> {
        let filter = ProductFilter {
            featured: Some(true),
            ..Default::default()
        };
        let products = self
            .db
            .products()
            .list(&filter, limit.clamp(1, MAX_PAGE_SIZE), 0)
            .await?;
        Ok(products.into_iter().map(ProductDto::from).collect())
    }

    /// Lists products currently on promotion.
    pub async fn promotions(&self, limit: i64) -> Result<Vec<ProductDto>, ApiError> {
        let filter = ProductFilter {
            promotion: Some(true),
            ..Default::default()
        };
        let products = self
            .db
            .products()
            .list(&filter, limit.clamp(1, MAX_PAGE_SIZE), 0)
            .await?;
        Ok(products.into_iter().map(ProductDto::from).collect())
    }

    /// Creates a product (admin).
    ///
    /// The slug is derived from the name; when no stock document is
    /// supplied, a zeroed structure is scaffolded from colors/sizes.
    pub async fn create(&self, req: ProductCreate) -> Result<ProductDto, ApiError> {
        validate_name(&req.name)?;
        validate_price(req.price)?;
        if let Some(promo) = req.promo_price {
            validate_price(promo)?;
        }

        let stock = match &req.stock {
            Some(value) => parse_stock_document(value)?,
            None => Stock::scaffold(&req.colors, &req.sizes),
        };

        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            slug: slugify(&req.name),
            name: req.name,
            description: req.description.unwrap_or_default(),
            price: req.price,
            promo_price: req.promo_price,
            on_promotion: false,
            featured: false,
            category: req.category,
            subcategory: req.subcategory,
            colors: req.colors,
            sizes: req.sizes,
            images: req.images,
            stock,
            active: true,
            created_at: now,
            updated_at: now,
        };

        self.db.products().insert(&product).await?;

        info!(id = %product.id, name = %product.name, "Product created");

        Ok(product.into())
    }

    /// Applies a partial update to a product (admin). A rename re-derives
    /// the slug.
    pub async fn update(&self, id: &str, req: ProductUpdate) -> Result<ProductDto, ApiError> {
        let mut product = self
            .db
            .products()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Product", id))?;

        if let Some(name) = req.name {
            validate_name(&name)?;
            product.slug = slugify(&name);
            product.name = name;
        }
        if let Some(description) = req.description {
            product.description = description;
        }
        if let Some(price) = req.price {
            validate_price(price)?;
            product.price = price;
        }
        if let Some(promo_price) = req.promo_price {
            validate_price(promo_price)?;
            product.promo_price = Some(promo_price);
        }
        if let Some(on_promotion) = req.on_promotion {
            product.on_promotion = on_promotion;
        }
        if let Some(featured) = req.featured {
            product.featured = featured;
        }
        if let Some(category) = req.category {
            product.category = category;
        }
        if let Some(subcategory) = req.subcategory {
            product.subcategory = Some(subcategory);
        }
        if let Some(colors) = req.colors {
            product.colors = colors;
        }
        if let Some(sizes) = req.sizes {
            product.sizes = sizes;
        }
        if let Some(images) = req.images {
            product.images = images;
        }
        if let Some(stock) = &req.stock {
            product.stock = parse_stock_document(stock)?;
        }
        if let Some(active) = req.active {
            product.active = active;
        }

        self.db.products().update(&product).await?;

        info!(id = %product.id, "Product updated");

        Ok(product.into())
    }

    /// Replaces a product's stock structure wholesale (admin).
    ///
    /// The caller supplies the complete new shape for the product's
    /// category convention; the shape itself is not validated against the
    /// category (documented convention, not an enforced invariant).
    pub async fn set_stock(&self, id: &str, document: Value) -> Result<ProductDto, ApiError> {
        let stock = parse_stock_document(&document)?;

        self.db.products().set_stock(id, &stock).await?;

        let updated = self.get(id).await?;
        info!(
            id = %id,
            stock_total = updated.stock_total,
            in_stock = updated.in_stock,
            "Stock replaced"
        );
        Ok(updated)
    }

    /// Soft-deletes a product (admin). The record stays for order history.
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.db.products().soft_delete(id).await?;
        info!(id = %id, "Product soft-deleted");
        Ok(())
    }
}

/// Translates an admin-supplied stock document, rejecting negative counts.
/// Unrecognized leaves are tolerated (and dropped) per the read policy.
fn parse_stock_document(value: &Value) -> Result<Stock, ApiError> {
    if has_negative_leaf(value) {
        return Err(ApiError::invalid_input(
            "Stock counts cannot be negative",
        ));
    }
    Ok(Stock::from_value(value))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use boutik_db::DbConfig;
    use serde_json::json;

    async fn service() -> CatalogService {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        CatalogService::new(db)
    }

    fn create_req(name: &str, category: &str) -> ProductCreate {
        ProductCreate {
            name: name.to_string(),
            description: Some(format!("{} description", name)),
            price: 10000,
            promo_price: None,
            category: category.to_string(),
            subcategory: None,
            colors: vec!["Noir".to_string()],
            sizes: vec![],
            images: vec![],
            stock: None,
        }
    }

    #[tokio::test]
    async fn test_create_scaffolds_stock_and_slug() {
        let service = service().await;

        let created = service.create(create_req("Parfum Marasi", "parfum")).await.unwrap();
        assert_eq!(created.product.slug, "parfum-marasi");
        assert_eq!(created.stock_total, 0);
        assert!(!created.in_stock);
        assert!(created.product.active);
    }

    #[tokio::test]
    async fn test_set_stock_updates_availability() {
        let service = service().await;
        let created = service.create(create_req("Parfum Marasi", "parfum")).await.unwrap();

        let updated = service
            .set_stock(&created.product.id, json!({"50ml": 10, "100ml": 5}))
            .await
            .unwrap();
        assert_eq!(updated.stock_total, 15);
        assert!(updated.in_stock);
    }

    #[tokio::test]
    async fn test_set_stock_rejects_negative_counts() {
        let service = service().await;
        let created = service.create(create_req("Parfum Marasi", "parfum")).await.unwrap();

        let err = service
            .set_stock(&created.product.id, json!({"50ml": -1}))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }

    #[tokio::test]
    async fn test_rename_rederives_slug() {
        let service = service().await;
        let created = service.create(create_req("Parfum Marasi", "parfum")).await.unwrap();

        let updated = service
            .update(
                &created.product.id,
                ProductUpdate {
                    name: Some("Parfum Nuit Étoilée".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.product.slug, "parfum-nuit-etoilee");
    }

    #[tokio::test]
    async fn test_delete_hides_from_listing() {
        let service = service().await;
        let created = service.create(create_req("Parfum Marasi", "parfum")).await.unwrap();

        service.delete(&created.product.id).await.unwrap();

        let listed = service.list(ProductListQuery::default()).await.unwrap();
        assert!(listed.data.is_empty());

        // Still readable by id for order history.
        let loaded = service.get(&created.product.id).await.unwrap();
        assert!(!loaded.product.active);
    }

    #[tokio::test]
    async fn test_pagination_math() {
        let service = service().await;
        for i in 0..3 {
            service
                .create(create_req(&format!("Produit {}", i), "parfum"))
                .await
                .unwrap();
        }

        let page = service
            .list(ProductListQuery {
                limit: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.total, 3);
        assert_eq!(page.pages, 2);
    }
}
