//! # Domain Types
//!
//! Core domain types used throughout Boutik.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Order       │   │      User       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  slug           │   │  order_number   │   │  phone          │       │
//! │  │  price (francs) │   │  status         │   │  role           │       │
//! │  │  stock (poly)   │   │  items snapshot │   │  password_hash  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   OrderStatus   │   │  PaymentStatus  │   │  PaymentMethod  │       │
//! │  │  Pending        │   │  Pending        │   │  Wave           │       │
//! │  │  Processing     │   │  Paid           │   │  OrangeMoney    │       │
//! │  │  Shipped        │   │  Failed         │   │  CashOnDelivery │       │
//! │  │  Delivered      │   │  Refunded       │   └─────────────────┘       │
//! │  │  Cancelled      │   └─────────────────┘                             │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::stock::{Availability, Stock};

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// URL-friendly identifier derived from the name.
    pub slug: String,

    /// Long description shown on the product page.
    pub description: String,

    /// Price in whole francs.
    pub price: i64,

    /// Promotional price, applied when `on_promotion` is set.
    pub promo_price: Option<i64>,

    /// Whether the promotional price is currently active.
    pub on_promotion: bool,

    /// Whether the product is featured on the storefront.
    pub featured: bool,

    /// Category, e.g. "parfum", "vetement", "accessoire".
    pub category: String,

    /// Optional subcategory, e.g. "50ml", "M".
    pub subcategory: Option<String>,

    /// Available color labels.
    pub colors: Vec<String>,

    /// Available size labels (empty for non-apparel).
    pub sizes: Vec<String>,

    /// Image URLs.
    pub images: Vec<String>,

    /// Polymorphic stock structure; see [`crate::stock`].
    pub stock: Stock,

    /// Soft-delete flag. Inactive products are excluded from listings but
    /// retained for existing orders' historical item snapshots.
    pub active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// The unit price a cart line snapshots right now:
    /// the promotional price when a promotion is active, else the price.
    pub fn effective_price(&self) -> i64 {
        if self.on_promotion {
            self.promo_price.unwrap_or(self.price)
        } else {
            self.price
        }
    }

    /// Derived availability figures (total units, in-stock flag).
    pub fn availability(&self) -> Availability {
        self.stock.availability()
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The lifecycle state of an order.
///
/// `pending → processing → shipped → delivered`, with `cancelled` reachable
/// from `pending` for the owning user. `delivered` and `cancelled` are
/// terminal. See [`crate::order`] for the transition rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order created, awaiting processing.
    Pending,
    /// Order accepted and being prepared.
    Processing,
    /// Order handed to the carrier.
    Shipped,
    /// Order received by the customer (terminal).
    Delivered,
    /// Order cancelled (terminal).
    Cancelled,
}

impl OrderStatus {
    /// Every recognized status, for validation and admin tooling.
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// The wire representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal states admit no further user-visible transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Error returned when parsing an unrecognized status string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

// =============================================================================
// Payment
// =============================================================================

/// Payment state tracked on an order, independent of the order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Awaiting payment.
    Pending,
    /// Payment confirmed.
    Paid,
    /// Payment attempt failed.
    Failed,
    /// Payment returned to the customer.
    Refunded,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Wave mobile money.
    Wave,
    /// Orange Money mobile money.
    OrangeMoney,
    /// Cash on delivery.
    CashOnDelivery,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Wave
    }
}

/// Payment method + status pair carried by an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfo {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
}

// =============================================================================
// Shipping
// =============================================================================

/// Recipient snapshot frozen onto the order at commit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    /// Recipient full name.
    pub recipient: String,
    /// Recipient phone number.
    pub phone: String,
    /// Street address.
    pub address: String,
    /// City.
    pub city: String,
    /// Shipping method label, e.g. "standard", "express".
    pub method: String,
}

// =============================================================================
// Order
// =============================================================================

/// A line item frozen onto an order.
///
/// Uses the snapshot pattern: name, unit price, and variant are copied
/// from the cart line at commit time so that subsequent product edits
/// never alter past orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Product reference, not owning (the product may go inactive later).
    pub product_id: String,
    /// Product name at commit time (frozen).
    pub name: String,
    /// Unit price in francs at cart-add time (frozen).
    pub unit_price: i64,
    /// Quantity ordered.
    pub quantity: i64,
    /// Size label, when the variant carries one.
    pub size: Option<String>,
    /// Color label, when the variant carries one.
    pub color: Option<String>,
}

impl OrderItem {
    /// Line total (unit price × quantity).
    pub fn line_total(&self) -> i64 {
        Money::from_units(self.unit_price)
            .multiply_quantity(self.quantity)
            .units()
    }

    /// The unit price as a [`Money`] value.
    pub fn unit_price(&self) -> Money {
        Money::from_units(self.unit_price)
    }
}

/// A committed order.
///
/// Created once, immutable except for `status`, `payment.status` and
/// `updated_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    /// Human-readable order number, `CMD-` + 8 uppercase hex characters.
    pub order_number: String,
    /// Owning user. Admins may read and mutate status, not content.
    pub user_id: String,
    /// Frozen deep copy of the cart lines at commit time.
    pub items: Vec<OrderItem>,
    /// Sum of line totals at commit time.
    pub subtotal: i64,
    /// Shipping cost in francs.
    pub shipping_cost: i64,
    /// `subtotal + shipping_cost`.
    pub total: i64,
    pub status: OrderStatus,
    pub shipping: ShippingInfo,
    pub payment: PaymentInfo,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// User
// =============================================================================

/// Access role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular customer.
    User,
    /// Back-office administrator.
    Admin,
}

impl Role {
    /// Parses a role label; only "user" and "admin" are recognized.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

/// A registered user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    /// Normalized phone number; the login identifier, unique.
    pub phone: String,
    /// Argon2 PHC-format digest. Never serialized to API responses
    /// (responses go through a dedicated DTO).
    pub password_hash: String,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether this account holds admin rights.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_order_status_round_trip() {
        for status in OrderStatus::ALL {
            let parsed: OrderStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_order_status_rejects_unknown() {
        let result: Result<OrderStatus, _> = "teleported".parse();
        assert!(result.is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
    }

    #[test]
    fn test_effective_price_prefers_active_promo() {
        let mut product = sample_product();
        assert_eq!(product.effective_price(), 10000);

        product.promo_price = Some(7500);
        // Promo price alone is not enough, the flag must be set.
        assert_eq!(product.effective_price(), 10000);

        product.on_promotion = true;
        assert_eq!(product.effective_price(), 7500);
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("user"), Some(Role::User));
        assert_eq!(Role::parse("superuser"), None);
    }

    fn sample_product() -> Product {
        Product {
            id: "p-1".to_string(),
            name: "Parfum Marasi".to_string(),
            slug: "parfum-marasi".to_string(),
            description: String::new(),
            price: 10000,
            promo_price: None,
            on_promotion: false,
            featured: false,
            category: "parfum".to_string(),
            subcategory: Some("50ml".to_string()),
            colors: vec![],
            sizes: vec![],
            images: vec![],
            stock: Stock::from_value(&json!({"50ml": 10})),
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
