//! Admin dashboard service: headline totals for the back office.

use serde::Serialize;

use crate::error::ApiError;
use boutik_db::Database;

/// Headline figures shown on the admin dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Active (non-deleted) products.
    pub total_products: i64,
    /// All registered users.
    pub total_users: i64,
    /// All orders ever committed.
    pub total_orders: i64,
    /// Sum of all order totals, in francs.
    pub total_revenue: i64,
}

/// Dashboard service implementation.
#[derive(Clone)]
pub struct DashboardService {
    db: Database,
}

impl DashboardService {
    /// Create a new dashboard service.
    pub fn new(db: Database) -> Self {
        DashboardService { db }
    }

    /// Gathers the headline totals.
    pub async fn stats(&self) -> Result<DashboardStats, ApiError> {
        let total_products = self.db.products().count_active().await?;
        let total_users = self.db.users().count(None).await?;
        let total_orders = self.db.orders().count().await?;
        let total_revenue = self.db.orders().revenue().await?;

        Ok(DashboardStats {
            total_products,
            total_users,
            total_orders,
            total_revenue,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
