//! # Repository Layer
//!
//! One repository per collection: `products`, `carts`, `orders`, `users`.
//!
//! ## Pattern
//! Each repository owns a clone of the shared pool and translates between
//! row shapes (JSON text columns) and domain types at this boundary. The
//! store offers point lookup, filtered scan with sort/skip/limit, and
//! atomic single-row replace; the service layer assumes nothing more.

pub mod cart;
pub mod order;
pub mod product;
pub mod user;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{DbError, DbResult};

/// Serializes a JSON document column for storage.
pub(crate) fn to_json<T: Serialize>(value: &T) -> DbResult<String> {
    serde_json::to_string(value).map_err(|e| DbError::Serialization(e.to_string()))
}

/// Deserializes a JSON document column read from storage.
pub(crate) fn from_json<T: DeserializeOwned>(raw: &str) -> DbResult<T> {
    serde_json::from_str(raw).map_err(|e| DbError::Serialization(e.to_string()))
}

/// Deserializes a JSON array column, tolerating legacy/garbage content by
/// falling back to the default. Used for secondary fields (labels, image
/// lists) where a malformed value should not make a product unreadable.
pub(crate) fn from_json_or_default<T: DeserializeOwned + Default>(raw: &str) -> T {
    serde_json::from_str(raw).unwrap_or_default()
}
