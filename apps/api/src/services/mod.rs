//! Service layer: the typed operation surface of the backend.
//!
//! Each service takes a resolved `userId` (authentication happens in the
//! extractors) plus typed arguments, and returns a typed result or one of
//! the named error kinds. The HTTP layer stays a thin mapping over this.

pub mod auth_service;
pub mod cart_service;
pub mod catalog_service;
pub mod dashboard_service;
pub mod order_service;
pub mod user_service;
