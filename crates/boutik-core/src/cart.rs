//! # Cart Model
//!
//! Per-user cart state and its mutation protocol.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Mutation Protocol                               │
//! │                                                                         │
//! │  add_line ───► merge by (productId, size, color), else append          │
//! │  update_line ─► set quantity; quantity ≤ 0 removes the line            │
//! │  remove_line ─► drop by line index                                      │
//! │  replace ────► bulk swap of all lines                                   │
//! │  clear ──────► items = [], total = 0                                    │
//! │                                                                         │
//! │  EVERY mutation recomputes total = Σ unitPrice × quantity.              │
//! │  The stored total is a cache, never trusted without recompute.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::{MAX_CART_ITEMS, MAX_LINE_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// One line of a cart.
///
/// ## Design Notes
/// - `product_id` is a reference, not ownership; the product may change
///   or go inactive after the line is created
/// - `unit_price` is a snapshot taken at add time (promo price when a
///   promotion was active), NOT the live product price
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Product reference (UUID).
    pub product_id: String,

    /// Product name at add time (frozen).
    pub name: String,

    /// Unit price in francs at add time (frozen).
    pub unit_price: i64,

    /// Quantity in cart, always positive.
    pub quantity: i64,

    /// Size label, when the variant carries one.
    pub size: Option<String>,

    /// Color label, when the variant carries one.
    pub color: Option<String>,
}

impl CartLine {
    /// Line total (unit price × quantity).
    pub fn line_total(&self) -> i64 {
        Money::from_units(self.unit_price)
            .multiply_quantity(self.quantity)
            .units()
    }

    /// Whether this line is the merge target for the given variant key.
    /// Line identity is the triple (product, size, color).
    pub fn matches_variant(
        &self,
        product_id: &str,
        size: Option<&str>,
        color: Option<&str>,
    ) -> bool {
        self.product_id == product_id
            && self.size.as_deref() == size
            && self.color.as_deref() == color
    }
}

// =============================================================================
// Cart
// =============================================================================

/// A user's cart: an ordered sequence of lines plus a cached total.
///
/// ## Invariants
/// - Lines are unique by (product_id, size, color); adding a matching
///   variant accumulates quantity in place
/// - Quantities are always positive; non-positive quantities remove lines
/// - `total` equals the sum of line totals after every mutation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Lines in insertion order.
    pub items: Vec<CartLine>,

    /// Cached total in francs, recomputed on every mutation.
    pub total: i64,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn empty() -> Self {
        Cart::default()
    }

    /// Checks if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of lines (not total quantity).
    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    /// The authoritative total: Σ unit_price × quantity over all lines.
    pub fn computed_total(&self) -> i64 {
        self.items.iter().map(CartLine::line_total).sum()
    }

    /// Recomputes and stores the cached total.
    pub fn recompute_total(&mut self) {
        self.total = self.computed_total();
    }

    /// Current quantity already in the cart for a variant key.
    /// Used by the stock check before a merge.
    pub fn quantity_of(&self, product_id: &str, size: Option<&str>, color: Option<&str>) -> i64 {
        self.items
            .iter()
            .find(|line| line.matches_variant(product_id, size, color))
            .map(|line| line.quantity)
            .unwrap_or(0)
    }

    /// Adds a line, merging into an existing line when the variant key
    /// (product_id, size, color) matches.
    ///
    /// ## Behavior
    /// - Matching line: quantity accumulates in place
    /// - No match: the line is appended as-is
    pub fn add_line(&mut self, line: CartLine) -> CoreResult<()> {
        if line.quantity <= 0 {
            return Err(CoreError::InvalidInput(
                "quantity must be positive".to_string(),
            ));
        }
        if line.quantity > MAX_LINE_QUANTITY {
            return Err(CoreError::InvalidInput(format!(
                "quantity cannot exceed {}",
                MAX_LINE_QUANTITY
            )));
        }

        if let Some(existing) = self.items.iter_mut().find(|existing| {
            existing.matches_variant(&line.product_id, line.size.as_deref(), line.color.as_deref())
        }) {
            let merged = existing.quantity + line.quantity;
            if merged > MAX_LINE_QUANTITY {
                return Err(CoreError::InvalidInput(format!(
                    "quantity cannot exceed {}",
                    MAX_LINE_QUANTITY
                )));
            }
            existing.quantity = merged;
            self.recompute_total();
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::InvalidInput(format!(
                "cart cannot have more than {} lines",
                MAX_CART_ITEMS
            )));
        }

        self.items.push(line);
        self.recompute_total();
        Ok(())
    }

    /// Sets the quantity of the line at `index`.
    ///
    /// ## Behavior
    /// - `quantity <= 0` removes the line (non-positive quantities are
    ///   never persisted)
    /// - Missing index: `NotFound`
    pub fn update_line(&mut self, index: usize, quantity: i64) -> CoreResult<()> {
        if index >= self.items.len() {
            return Err(CoreError::not_found("Cart line", index.to_string()));
        }

        if quantity <= 0 {
            self.items.remove(index);
        } else {
            if quantity > MAX_LINE_QUANTITY {
                return Err(CoreError::InvalidInput(format!(
                    "quantity cannot exceed {}",
                    MAX_LINE_QUANTITY
                )));
            }
            self.items[index].quantity = quantity;
        }

        self.recompute_total();
        Ok(())
    }

    /// Removes the line at `index`.
    pub fn remove_line(&mut self, index: usize) -> CoreResult<()> {
        if index >= self.items.len() {
            return Err(CoreError::not_found("Cart line", index.to_string()));
        }

        self.items.remove(index);
        self.recompute_total();
        Ok(())
    }

    /// Replaces all lines at once (bulk update).
    ///
    /// Recomputes the total from the supplied lines. Stock is NOT
    /// re-validated here; the caller owns that responsibility.
    pub fn replace(&mut self, items: Vec<CartLine>) -> CoreResult<()> {
        if items.len() > MAX_CART_ITEMS {
            return Err(CoreError::InvalidInput(format!(
                "cart cannot have more than {} lines",
                MAX_CART_ITEMS
            )));
        }
        if items
            .iter()
            .any(|line| line.quantity <= 0 || line.quantity > MAX_LINE_QUANTITY)
        {
            return Err(CoreError::InvalidInput(format!(
                "quantity must be between 1 and {}",
                MAX_LINE_QUANTITY
            )));
        }

        self.items = items;
        self.recompute_total();
        Ok(())
    }

    /// Empties the cart. Idempotent.
    pub fn clear(&mut self) {
        self.items.clear();
        self.total = 0;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: &str, price: i64, quantity: i64, size: Option<&str>) -> CartLine {
        CartLine {
            product_id: product_id.to_string(),
            name: format!("Product {}", product_id),
            unit_price: price,
            quantity,
            size: size.map(String::from),
            color: None,
        }
    }

    #[test]
    fn test_add_line() {
        let mut cart = Cart::empty();
        cart.add_line(line("p1", 2500, 2, None)).unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.total, 5000);
    }

    #[test]
    fn test_add_same_variant_merges() {
        let mut cart = Cart::empty();
        cart.add_line(line("p1", 2500, 2, Some("M"))).unwrap();
        cart.add_line(line("p1", 2500, 3, Some("M"))).unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.items[0].quantity, 5);
        assert_eq!(cart.total, 12500);
    }

    #[test]
    fn test_different_variant_appends() {
        let mut cart = Cart::empty();
        cart.add_line(line("p1", 2500, 1, Some("M"))).unwrap();
        cart.add_line(line("p1", 2500, 1, Some("L"))).unwrap();

        assert_eq!(cart.line_count(), 2);
    }

    #[test]
    fn test_total_matches_recompute_after_any_sequence() {
        let mut cart = Cart::empty();
        cart.add_line(line("p1", 1000, 2, None)).unwrap();
        cart.add_line(line("p2", 3000, 1, None)).unwrap();
        cart.update_line(0, 5).unwrap();
        cart.remove_line(1).unwrap();
        cart.add_line(line("p3", 500, 4, None)).unwrap();

        assert_eq!(cart.total, cart.computed_total());
        assert_eq!(cart.total, 7000);
    }

    #[test]
    fn test_update_to_zero_removes_line() {
        let mut cart = Cart::empty();
        cart.add_line(line("p1", 1000, 2, None)).unwrap();
        cart.update_line(0, 0).unwrap();

        assert!(cart.is_empty());
        assert_eq!(cart.total, 0);
    }

    #[test]
    fn test_update_missing_index_fails() {
        let mut cart = Cart::empty();
        let err = cart.update_line(3, 1).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[test]
    fn test_remove_missing_index_fails() {
        let mut cart = Cart::empty();
        cart.add_line(line("p1", 1000, 1, None)).unwrap();
        let err = cart.remove_line(1).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut cart = Cart::empty();
        cart.add_line(line("p1", 1000, 1, None)).unwrap();
        cart.clear();
        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(cart.total, 0);
    }

    #[test]
    fn test_replace_recomputes_total() {
        let mut cart = Cart::empty();
        cart.add_line(line("p1", 1000, 1, None)).unwrap();

        cart.replace(vec![line("p2", 2000, 2, None), line("p3", 500, 1, None)])
            .unwrap();

        assert_eq!(cart.line_count(), 2);
        assert_eq!(cart.total, 4500);
    }

    #[test]
    fn test_replace_rejects_non_positive_quantity() {
        let mut cart = Cart::empty();
        let err = cart.replace(vec![line("p1", 1000, 0, None)]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn test_add_rejects_non_positive_quantity() {
        let mut cart = Cart::empty();
        let err = cart.add_line(line("p1", 1000, -1, None)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }
}
