//! # Product Repository
//!
//! Database operations for the `products` collection.
//!
//! ## Key Operations
//! - Filtered listing (category, subcategory, search, featured, promotion)
//!   with sort/skip/limit
//! - Point lookup by id
//! - Wholesale stock replacement
//! - Soft delete (products referenced by orders are never erased)
//!
//! The polymorphic `stock` column is stored as its raw JSON document and
//! translated into [`Stock`] here, at the storage boundary.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::{from_json_or_default, to_json};
use boutik_core::{Product, Stock};

/// Filters for product listings. All fields are optional; `None` means
/// "don't filter on this".
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    /// Case-insensitive substring match over name and description.
    pub search: Option<String>,
    pub featured: Option<bool>,
    pub promotion: Option<bool>,
}

/// Row shape of the `products` table. JSON columns stay raw here and are
/// translated in [`ProductRow::into_product`].
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    slug: String,
    description: String,
    price: i64,
    promo_price: Option<i64>,
    on_promotion: bool,
    featured: bool,
    category: String,
    subcategory: Option<String>,
    colors: String,
    sizes: String,
    images: String,
    stock: String,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self) -> Product {
        Product {
            id: self.id,
            name: self.name,
            slug: self.slug,
            description: self.description,
            price: self.price,
            promo_price: self.promo_price,
            on_promotion: self.on_promotion,
            featured: self.featured,
            category: self.category,
            subcategory: self.subcategory,
            colors: from_json_or_default(&self.colors),
            sizes: from_json_or_default(&self.sizes),
            images: from_json_or_default(&self.images),
            // Tolerant translation: a malformed stock document reads as
            // empty rather than making the product unreadable.
            stock: Stock::from_json_str(&self.stock),
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const SELECT_COLUMNS: &str = "SELECT id, name, slug, description, price, promo_price, \
     on_promotion, featured, category, subcategory, colors, sizes, images, \
     stock, active, created_at, updated_at FROM products";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists active products matching the filter, newest first.
    ///
    /// Inactive products are excluded from every listing; they remain
    /// reachable by id for order history.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Product>> {
        debug!(?filter, limit, offset, "Listing products");

        let mut qb = QueryBuilder::<Sqlite>::new(SELECT_COLUMNS);
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows: Vec<ProductRow> = qb.build_query_as().fetch_all(&self.pool).await?;

        debug!(count = rows.len(), "Listing returned products");
        Ok(rows.into_iter().map(ProductRow::into_product).collect())
    }

    /// Counts active products matching the filter (for pagination).
    pub async fn count(&self, filter: &ProductFilter) -> DbResult<i64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM products");
        push_filters(&mut qb, filter);

        let count: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// Gets a product by its id.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found (active or not)
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("{} WHERE id = ?1", SELECT_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(ProductRow::into_product))
    }

    /// Inserts a new product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, slug, description, price, promo_price,
                on_promotion, featured, category, subcategory,
                colors, sizes, images, stock, active,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14, ?15,
                ?16, ?17
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.promo_price)
        .bind(product.on_promotion)
        .bind(product.featured)
        .bind(&product.category)
        .bind(&product.subcategory)
        .bind(to_json(&product.colors)?)
        .bind(to_json(&product.sizes)?)
        .bind(to_json(&product.images)?)
        .bind(to_json(&product.stock)?)
        .bind(product.active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing product wholesale.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                slug = ?3,
                description = ?4,
                price = ?5,
                promo_price = ?6,
                on_promotion = ?7,
                featured = ?8,
                category = ?9,
                subcategory = ?10,
                colors = ?11,
                sizes = ?12,
                images = ?13,
                stock = ?14,
                active = ?15,
                updated_at = ?16
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.promo_price)
        .bind(product.on_promotion)
        .bind(product.featured)
        .bind(&product.category)
        .bind(&product.subcategory)
        .bind(to_json(&product.colors)?)
        .bind(to_json(&product.sizes)?)
        .bind(to_json(&product.images)?)
        .bind(to_json(&product.stock)?)
        .bind(product.active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Replaces a product's stock structure wholesale.
    ///
    /// No partial merge: the caller supplies the complete new shape for
    /// the product's category convention.
    pub async fn set_stock(&self, id: &str, stock: &Stock) -> DbResult<()> {
        debug!(id = %id, "Replacing product stock");

        let result = sqlx::query(
            r#"
            UPDATE products SET stock = ?2, updated_at = ?3 WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(to_json(stock)?)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Soft-deletes a product by setting active = false.
    ///
    /// ## Why Soft Delete?
    /// Historical orders still reference this product; the snapshot stays
    /// intact and the record can be restored.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query(
            r#"
            UPDATE products SET active = 0, updated_at = ?2 WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for the admin dashboard).
    pub async fn count_active(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Appends the WHERE clause shared by `list` and `count`.
fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &ProductFilter) {
    qb.push(" WHERE active = 1");

    if let Some(category) = &filter.category {
        qb.push(" AND category = ");
        qb.push_bind(category.clone());
    }
    if let Some(subcategory) = &filter.subcategory {
        qb.push(" AND subcategory = ");
        qb.push_bind(subcategory.clone());
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search);
        qb.push(" AND (name LIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR description LIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }
    if let Some(featured) = filter.featured {
        qb.push(" AND featured = ");
        qb.push_bind(featured);
    }
    if let Some(promotion) = filter.promotion {
        qb.push(" AND on_promotion = ");
        qb.push_bind(promotion);
    }
}

/// Helper to generate a new product id.
///
/// ## Usage
/// ```rust,ignore
/// let id = generate_product_id();
/// let product = Product { id, ... };
/// ```
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
