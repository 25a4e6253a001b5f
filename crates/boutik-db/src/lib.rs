//! # boutik-db: Database Layer for Boutik
//!
//! This crate provides database access for the Boutik backend.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Boutik Data Flow                                 │
//! │                                                                         │
//! │  Service call (cart add, checkout, ...)                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     boutik-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ product/cart/ │    │  (embedded)  │  │   │
//! │  │   │               │◄───│ order/user    │    │ 001_init.sql │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │                       SQLite Database (WAL mode)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (product, cart, order, user)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use boutik_db::{Database, DbConfig};
//!
//! let config = DbConfig::new("path/to/boutik.db");
//! let db = Database::new(config).await?;
//!
//! let products = db.products().list(&ProductFilter::default(), 50, 0).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::cart::CartRepository;
pub use repository::order::OrderRepository;
pub use repository::product::{generate_product_id, ProductFilter, ProductRepository};
pub use repository::user::UserRepository;
