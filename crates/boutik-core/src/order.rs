//! # Order Rules
//!
//! Order construction from a cart and the status lifecycle rules.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Order Status Lifecycle                              │
//! │                                                                         │
//! │   pending ──► processing ──► shipped ──► delivered (terminal)          │
//! │      │                                                                  │
//! │      └──────► cancelled (terminal)                                     │
//! │                                                                         │
//! │  Owner:  cancel only while pending.                                     │
//! │  Admin:  may force any status (set_status path is unguarded;           │
//! │          operational flexibility, including forced cancellation).      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use uuid::Uuid;

use crate::cart::Cart;
use crate::error::{CoreError, CoreResult};
use crate::types::{
    Order, OrderItem, OrderStatus, PaymentInfo, PaymentMethod, PaymentStatus, ShippingInfo,
};

/// Bounded attempts for order-number generation on collision.
/// Collisions over 8 hex characters are negligible but handled, not
/// assumed impossible.
pub const ORDER_NUMBER_ATTEMPTS: u32 = 5;

// =============================================================================
// Order Number
// =============================================================================

/// Generates a human-readable order number: `CMD-` + 8 random uppercase
/// hex characters, e.g. `CMD-3FA2B91C`.
///
/// Entropy comes from a UUID v4; uniqueness is ultimately enforced by the
/// storage layer's unique index, with bounded retries on collision.
pub fn generate_order_number() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("CMD-{}", hex[..8].to_uppercase())
}

// =============================================================================
// Order Construction
// =============================================================================

/// Builds an order snapshot from a cart.
///
/// ## What This Does
/// 1. Rejects an empty cart (`EmptyCart`)
/// 2. Freezes a deep copy of the cart lines; the snapshotted prices are
///    authoritative; live product prices are never re-read
/// 3. Recomputes subtotal from the frozen lines (the cached cart total is
///    never trusted without recompute)
/// 4. total = subtotal + shipping_cost
///
/// Persistence, order-number collision retries, and cart clearing are the
/// caller's concern; this function is pure apart from id/number/timestamp
/// generation.
pub fn build_order(
    user_id: &str,
    cart: &Cart,
    shipping: ShippingInfo,
    payment_method: PaymentMethod,
    shipping_cost: i64,
    notes: Option<String>,
) -> CoreResult<Order> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }
    if shipping_cost < 0 {
        return Err(CoreError::InvalidInput(
            "shipping cost cannot be negative".to_string(),
        ));
    }

    let items: Vec<OrderItem> = cart
        .items
        .iter()
        .map(|line| OrderItem {
            product_id: line.product_id.clone(),
            name: line.name.clone(),
            unit_price: line.unit_price,
            quantity: line.quantity,
            size: line.size.clone(),
            color: line.color.clone(),
        })
        .collect();

    let subtotal: i64 = items.iter().map(OrderItem::line_total).sum();
    let now = Utc::now();

    Ok(Order {
        id: Uuid::new_v4().to_string(),
        order_number: generate_order_number(),
        user_id: user_id.to_string(),
        items,
        subtotal,
        shipping_cost,
        total: subtotal + shipping_cost,
        status: OrderStatus::Pending,
        shipping,
        payment: PaymentInfo {
            method: payment_method,
            status: PaymentStatus::Pending,
        },
        notes,
        created_at: now,
        updated_at: now,
    })
}

// =============================================================================
// Lifecycle Rules
// =============================================================================

/// Validates a user-initiated cancellation.
///
/// ## Rules
/// - Only the owning user may cancel (`Forbidden` otherwise)
/// - Only a `pending` order may be cancelled by its owner
///   (`InvalidTransition` otherwise)
pub fn validate_user_cancel(order: &Order, user_id: &str) -> CoreResult<()> {
    if order.user_id != user_id {
        return Err(CoreError::Forbidden(
            "order belongs to another user".to_string(),
        ));
    }
    if order.status != OrderStatus::Pending {
        return Err(CoreError::InvalidTransition {
            from: order.status,
            to: OrderStatus::Cancelled,
        });
    }
    Ok(())
}

/// Parses an admin-supplied status string.
///
/// Unknown values map to `InvalidInput`; the admin path has no further
/// transition guard; admins may force any status.
pub fn parse_admin_status(raw: &str) -> CoreResult<OrderStatus> {
    raw.parse()
        .map_err(|_| CoreError::InvalidInput(format!("unknown order status: {}", raw)))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartLine;

    fn shipping() -> ShippingInfo {
        ShippingInfo {
            recipient: "Awa Diop".to_string(),
            phone: "771234567".to_string(),
            address: "Rue 10".to_string(),
            city: "Dakar".to_string(),
            method: "standard".to_string(),
        }
    }

    fn cart_with_lines() -> Cart {
        let mut cart = Cart::empty();
        cart.add_line(CartLine {
            product_id: "p1".to_string(),
            name: "Parfum Marasi".to_string(),
            unit_price: 10000,
            quantity: 2,
            size: Some("50ml".to_string()),
            color: None,
        })
        .unwrap();
        cart.add_line(CartLine {
            product_id: "p2".to_string(),
            name: "Chemise Lin".to_string(),
            unit_price: 6990,
            quantity: 1,
            size: Some("M".to_string()),
            color: Some("Blanc".to_string()),
        })
        .unwrap();
        cart
    }

    #[test]
    fn test_order_number_format() {
        let number = generate_order_number();
        assert!(number.starts_with("CMD-"));
        assert_eq!(number.len(), 12);
        assert!(number[4..]
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn test_order_numbers_are_distinct() {
        let a = generate_order_number();
        let b = generate_order_number();
        assert_ne!(a, b);
    }

    #[test]
    fn test_build_order_snapshots_cart() {
        let cart = cart_with_lines();
        let order = build_order(
            "u1",
            &cart,
            shipping(),
            PaymentMethod::Wave,
            1500,
            None,
        )
        .unwrap();

        assert_eq!(order.items.len(), 2);
        assert_eq!(order.subtotal, cart.computed_total());
        assert_eq!(order.total, order.subtotal + 1500);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment.status, PaymentStatus::Pending);
        assert_eq!(order.items[0].unit_price, 10000);
    }

    #[test]
    fn test_build_order_rejects_empty_cart() {
        let cart = Cart::empty();
        let err = build_order("u1", &cart, shipping(), PaymentMethod::Wave, 0, None).unwrap_err();
        assert!(matches!(err, CoreError::EmptyCart));
    }

    #[test]
    fn test_build_order_rejects_negative_shipping() {
        let cart = cart_with_lines();
        let err =
            build_order("u1", &cart, shipping(), PaymentMethod::Wave, -100, None).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn test_owner_can_cancel_pending() {
        let cart = cart_with_lines();
        let order = build_order("u1", &cart, shipping(), PaymentMethod::Wave, 0, None).unwrap();
        assert!(validate_user_cancel(&order, "u1").is_ok());
    }

    #[test]
    fn test_non_owner_cancel_is_forbidden() {
        let cart = cart_with_lines();
        let order = build_order("u1", &cart, shipping(), PaymentMethod::Wave, 0, None).unwrap();
        let err = validate_user_cancel(&order, "u2").unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));
    }

    #[test]
    fn test_cancel_shipped_is_invalid_transition() {
        let cart = cart_with_lines();
        let mut order = build_order("u1", &cart, shipping(), PaymentMethod::Wave, 0, None).unwrap();
        order.status = OrderStatus::Shipped;

        let err = validate_user_cancel(&order, "u1").unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidTransition {
                from: OrderStatus::Shipped,
                to: OrderStatus::Cancelled,
            }
        ));
    }

    #[test]
    fn test_parse_admin_status() {
        assert_eq!(parse_admin_status("shipped").unwrap(), OrderStatus::Shipped);
        assert!(matches!(
            parse_admin_status("teleported").unwrap_err(),
            CoreError::InvalidInput(_)
        ));
    }
}
