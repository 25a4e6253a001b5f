//! # HTTP Routes
//!
//! Thin axum handlers over the service layer.
//!
//! Every handler does three things and nothing more: resolve the caller
//! (via the [`AuthUser`]/[`AdminUser`] extractors), delegate to a service,
//! and wrap the typed result. Error kinds map to status codes in
//! [`crate::error`]; no handler constructs a status code by hand.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::{AdminUser, AuthUser};
use crate::error::ApiError;
use crate::services::auth_service::{
    AuthResponse, AuthService, LoginRequest, RegisterRequest, UserDto,
};
use crate::services::cart_service::{AddToCartRequest, CartService, ReplaceCartRequest};
use crate::services::catalog_service::{
    CatalogService, ProductCreate, ProductDto, ProductListQuery, ProductListResponse,
    ProductUpdate,
};
use crate::services::dashboard_service::{DashboardService, DashboardStats};
use crate::services::order_service::{CheckoutRequest, OrderListQuery, OrderService};
use crate::services::user_service::{UserListQuery, UserService};
use crate::AppState;
use boutik_core::{Cart, Order};

// =============================================================================
// Response Envelopes
// =============================================================================

/// Standard success envelope: `{"success": true, "data": ...}`.
#[derive(Debug, Serialize)]
struct Envelope<T> {
    success: bool,
    data: T,
}

fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        data,
    })
}

/// Paginated product listing: pagination fields at the top level.
#[derive(Debug, Serialize)]
struct ProductListEnvelope {
    success: bool,
    #[serde(flatten)]
    body: ProductListResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserListEnvelope {
    success: bool,
    data: Vec<UserDto>,
    total: i64,
}

// =============================================================================
// Small Request Bodies
// =============================================================================

#[derive(Debug, Deserialize)]
struct QuantityBody {
    quantity: i64,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: String,
}

#[derive(Debug, Deserialize)]
struct RoleBody {
    role: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LimitQuery {
    limit: Option<i64>,
}

// =============================================================================
// Router
// =============================================================================

/// Builds the full API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/api/health", get(health))
        // Auth
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        // Catalog (public reads, admin writes)
        .route("/api/products", get(list_products).post(create_product))
        .route("/api/products/featured", get(featured_products))
        .route("/api/products/promotions", get(promotion_products))
        .route(
            "/api/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/api/products/{id}/stock", put(set_product_stock))
        // Cart
        .route("/api/cart", get(get_cart).put(replace_cart).delete(clear_cart))
        .route("/api/cart/add", post(add_to_cart))
        .route(
            "/api/cart/items/{index}",
            put(update_cart_item).delete(remove_cart_item),
        )
        // Orders
        .route("/api/orders", get(list_my_orders).post(checkout))
        .route("/api/orders/{id}", get(get_order))
        .route("/api/orders/{id}/cancel", post(cancel_order))
        // Admin: orders, users, dashboard
        .route("/api/admin/orders", get(admin_list_orders))
        .route("/api/admin/orders/{id}/status", put(admin_set_order_status))
        .route(
            "/api/admin/orders/{id}/payment",
            put(admin_set_payment_status),
        )
        .route("/api/users", get(list_users))
        .route("/api/users/{id}", get(get_user).delete(delete_user))
        .route("/api/users/{id}/role", put(set_user_role))
        .route("/api/dashboard", get(dashboard))
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
    database: bool,
}

async fn health(State(state): State<AppState>) -> Json<HealthBody> {
    Json(HealthBody {
        status: "ok",
        database: state.db.health_check().await,
    })
}

// =============================================================================
// Auth Handlers
// =============================================================================

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<Envelope<AuthResponse>>, ApiError> {
    let response = AuthService::new(state.db.clone(), state.jwt.clone())
        .register(req)
        .await?;
    Ok(ok(response))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Envelope<AuthResponse>>, ApiError> {
    let response = AuthService::new(state.db.clone(), state.jwt.clone())
        .login(req)
        .await?;
    Ok(ok(response))
}

async fn me(AuthUser(user): AuthUser) -> Json<Envelope<UserDto>> {
    ok(UserDto::from(user))
}

// =============================================================================
// Catalog Handlers
// =============================================================================

async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<ProductListEnvelope>, ApiError> {
    let body = CatalogService::new(state.db.clone()).list(query).await?;
    Ok(Json(ProductListEnvelope {
        success: true,
        body,
    }))
}

async fn featured_products(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Envelope<Vec<ProductDto>>>, ApiError> {
    let products = CatalogService::new(state.db.clone())
        .featured(query.limit.unwrap_or(20))
        .await?;
    Ok(ok(products))
}

async fn promotion_products(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Envelope<Vec<ProductDto>>>, ApiError> {
    let products = CatalogService::new(state.db.clone())
        .promotions(query.limit.unwrap_or(20))
        .await?;
    Ok(ok(products))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Envelope<ProductDto>>, ApiError> {
    let product = CatalogService::new(state.db.clone()).get(&id).await?;
    Ok(ok(product))
}

async fn create_product(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(req): Json<ProductCreate>,
) -> Result<Json<Envelope<ProductDto>>, ApiError> {
    let product = CatalogService::new(state.db.clone()).create(req).await?;
    Ok(ok(product))
}

async fn update_product(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    Json(req): Json<ProductUpdate>,
) -> Result<Json<Envelope<ProductDto>>, ApiError> {
    let product = CatalogService::new(state.db.clone()).update(&id, req).await?;
    Ok(ok(product))
}

async fn set_product_stock(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    Json(document): Json<Value>,
) -> Result<Json<Envelope<ProductDto>>, ApiError> {
    let product = CatalogService::new(state.db.clone())
        .set_stock(&id, document)
        .await?;
    Ok(ok(product))
}

async fn delete_product(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<Envelope<()>>, ApiError> {
    CatalogService::new(state.db.clone()).delete(&id).await?;
    Ok(ok(()))
}

// =============================================================================
// Cart Handlers
// =============================================================================

async fn get_cart(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Envelope<Cart>>, ApiError> {
    let cart = CartService::new(state.db.clone()).get(&user.id).await?;
    Ok(ok(cart))
}

async fn add_to_cart(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<AddToCartRequest>,
) -> Result<Json<Envelope<Cart>>, ApiError> {
    let cart = CartService::new(state.db.clone())
        .add_item(&user.id, req)
        .await?;
    Ok(ok(cart))
}

async fn replace_cart(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<ReplaceCartRequest>,
) -> Result<Json<Envelope<Cart>>, ApiError> {
    let cart = CartService::new(state.db.clone())
        .replace(&user.id, req)
        .await?;
    Ok(ok(cart))
}

async fn update_cart_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(index): Path<usize>,
    Json(body): Json<QuantityBody>,
) -> Result<Json<Envelope<Cart>>, ApiError> {
    let cart = CartService::new(state.db.clone())
        .update_item(&user.id, index, body.quantity)
        .await?;
    Ok(ok(cart))
}

async fn remove_cart_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(index): Path<usize>,
) -> Result<Json<Envelope<Cart>>, ApiError> {
    let cart = CartService::new(state.db.clone())
        .remove_item(&user.id, index)
        .await?;
    Ok(ok(cart))
}

async fn clear_cart(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Envelope<Cart>>, ApiError> {
    let cart = CartService::new(state.db.clone()).clear(&user.id).await?;
    Ok(ok(cart))
}

// =============================================================================
// Order Handlers
// =============================================================================

async fn checkout(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<CheckoutRequest>,
) -> Result<Json<Envelope<Order>>, ApiError> {
    let order = OrderService::new(state.db.clone())
        .checkout(&user.id, req)
        .await?;
    Ok(ok(order))
}

async fn list_my_orders(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<Envelope<Vec<Order>>>, ApiError> {
    let orders = OrderService::new(state.db.clone())
        .list_for_user(&user.id, query)
        .await?;
    Ok(ok(orders))
}

async fn get_order(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Envelope<Order>>, ApiError> {
    let order = OrderService::new(state.db.clone()).get(&id, &user).await?;
    Ok(ok(order))
}

async fn cancel_order(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Envelope<Order>>, ApiError> {
    let order = OrderService::new(state.db.clone())
        .cancel(&id, &user.id)
        .await?;
    Ok(ok(order))
}

async fn admin_list_orders(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<Envelope<Vec<Order>>>, ApiError> {
    let orders = OrderService::new(state.db.clone()).admin_list(query).await?;
    Ok(ok(orders))
}

async fn admin_set_order_status(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    Json(body): Json<StatusBody>,
) -> Result<Json<Envelope<Order>>, ApiError> {
    let order = OrderService::new(state.db.clone())
        .admin_set_status(&id, &body.status)
        .await?;
    Ok(ok(order))
}

async fn admin_set_payment_status(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    Json(body): Json<StatusBody>,
) -> Result<Json<Envelope<Order>>, ApiError> {
    let order = OrderService::new(state.db.clone())
        .admin_set_payment_status(&id, &body.status)
        .await?;
    Ok(ok(order))
}

// =============================================================================
// User Admin Handlers
// =============================================================================

async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<UserListQuery>,
) -> Result<Json<UserListEnvelope>, ApiError> {
    let (data, total) = UserService::new(state.db.clone()).list(query).await?;
    Ok(Json(UserListEnvelope {
        success: true,
        data,
        total,
    }))
}

async fn get_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<Envelope<UserDto>>, ApiError> {
    let user = UserService::new(state.db.clone()).get(&id).await?;
    Ok(ok(user))
}

async fn set_user_role(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    Json(body): Json<RoleBody>,
) -> Result<Json<Envelope<UserDto>>, ApiError> {
    let user = UserService::new(state.db.clone())
        .set_role(&id, &body.role)
        .await?;
    Ok(ok(user))
}

async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<Envelope<()>>, ApiError> {
    UserService::new(state.db.clone())
        .delete(&id, &admin.id)
        .await?;
    Ok(ok(()))
}

// =============================================================================
// Dashboard Handler
// =============================================================================

async fn dashboard(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Envelope<DashboardStats>>, ApiError> {
    let stats = DashboardService::new(state.db.clone()).stats().await?;
    Ok(ok(stats))
}
