//! Authentication service: register, login, profile.
//!
//! Phone numbers are the login identifier. Registration normalizes and
//! validates the number; login accepts either spelling (with or without
//! the `+221` prefix) and answers with a uniform `Unauthorized` whether
//! the number is unknown or the password is wrong.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::{hash_password, verify_password, JwtManager};
use crate::error::ApiError;
use boutik_core::validation::{normalize_phone, validate_password};
use boutik_core::{Role, User};
use boutik_db::Database;

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub phone: String,
    pub password: String,
}

/// Public view of a user account; never carries the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub role: Role,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        UserDto {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: UserDto,
}

// =============================================================================
// Service
// =============================================================================

/// Authentication service implementation.
#[derive(Clone)]
pub struct AuthService {
    db: Database,
    jwt: JwtManager,
}

impl AuthService {
    /// Create a new authentication service.
    pub fn new(db: Database, jwt: JwtManager) -> Self {
        AuthService { db, jwt }
    }

    /// Registers a new user account and issues a token.
    ///
    /// ## Errors
    /// - `InvalidInput` - empty names, weak password, malformed phone
    /// - `Conflict` - phone number already registered
    pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse, ApiError> {
        if req.first_name.trim().is_empty() || req.last_name.trim().is_empty() {
            return Err(ApiError::invalid_input("First and last name are required"));
        }
        validate_password(&req.password)?;
        let phone = normalize_phone(&req.phone)?;

        // Probe both spellings so +221771234567 and 771234567 can't
        // register as two accounts.
        if self
            .db
            .users()
            .get_by_phone_variants(&phone_variants(&phone))
            .await?
            .is_some()
        {
            return Err(ApiError::conflict("Phone number already registered"));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            phone,
            password_hash: hash_password(&req.password)?,
            role: Role::User,
            active: true,
            created_at: now,
            updated_at: now,
        };

        self.db.users().insert(&user).await?;
        let token = self.jwt.issue(&user.id)?;

        info!(user_id = %user.id, "User registered");

        Ok(AuthResponse {
            token,
            user: user.into(),
        })
    }

    /// Authenticates a user and issues a token.
    ///
    /// ## Errors
    /// - `Unauthorized` - unknown number or wrong password (uniform on
    ///   purpose: no account enumeration)
    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, ApiError> {
        let cleaned: String = req
            .phone
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '+')
            .collect();

        let user = self
            .db
            .users()
            .get_by_phone_variants(&phone_variants(&cleaned))
            .await?;

        let user = match user {
            Some(user) if verify_password(&req.password, &user.password_hash) => user,
            _ => return Err(ApiError::unauthorized("Incorrect phone number or password")),
        };

        let token = self.jwt.issue(&user.id)?;

        info!(user_id = %user.id, "User logged in");

        Ok(AuthResponse {
            token,
            user: user.into(),
        })
    }
}

/// The spellings a phone number may be stored under: with and without the
/// `+221` country prefix.
fn phone_variants(cleaned: &str) -> Vec<String> {
    match cleaned.strip_prefix("+221") {
        Some(local) => vec![cleaned.to_string(), local.to_string()],
        None => vec![cleaned.to_string(), format!("+221{}", cleaned)],
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use boutik_db::DbConfig;

    async fn service() -> AuthService {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        AuthService::new(db, JwtManager::new("test-secret".to_string(), 3600))
    }

    fn register_req(phone: &str) -> RegisterRequest {
        RegisterRequest {
            first_name: "Awa".to_string(),
            last_name: "Diop".to_string(),
            phone: phone.to_string(),
            password: "s3cret-pass".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let service = service().await;

        let registered = service.register(register_req("77 123 45 67")).await.unwrap();
        assert_eq!(registered.user.phone, "771234567");
        assert_eq!(registered.user.role, Role::User);

        let logged_in = service
            .login(LoginRequest {
                phone: "+221771234567".to_string(), // other spelling
                password: "s3cret-pass".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(logged_in.user.id, registered.user.id);
    }

    #[tokio::test]
    async fn test_duplicate_phone_conflicts() {
        let service = service().await;

        service.register(register_req("771234567")).await.unwrap();
        let err = service
            .register(register_req("+221771234567"))
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let service = service().await;
        service.register(register_req("771234567")).await.unwrap();

        let err = service
            .login(LoginRequest {
                phone: "771234567".to_string(),
                password: "wrong".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn test_malformed_phone_rejected() {
        let service = service().await;
        let err = service.register(register_req("0612345678")).await.unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidInput);
    }
}
