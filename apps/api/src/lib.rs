//! # boutik-api: HTTP API Server
//!
//! The outward-facing surface of the Boutik backend.
//!
//! ## Layering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  routes    - axum handlers; resolve the caller, delegate, wrap          │
//! │  services  - the typed operation surface (auth, catalog, cart, orders)  │
//! │  auth      - JWT issue/verify, argon2 hashing, extractors               │
//! │  error     - ApiError: the error taxonomy mapped to HTTP statuses       │
//! │  config    - environment-driven startup configuration                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod services;

use crate::auth::JwtManager;
use crate::config::ApiConfig;
use boutik_db::Database;

/// Shared application state handed to every handler.
///
/// All fields are cheap to clone: the database handle shares one pool,
/// the JWT manager is a secret plus two integers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Database handle (shared connection pool).
    pub db: Database,

    /// Token service.
    pub jwt: JwtManager,

    /// Startup configuration.
    pub config: ApiConfig,
}

impl AppState {
    /// Builds the application state from loaded configuration and a
    /// connected database.
    pub fn new(config: ApiConfig, db: Database) -> Self {
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_lifetime_secs);
        AppState { db, jwt, config }
    }
}
