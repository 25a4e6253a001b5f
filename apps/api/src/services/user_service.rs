//! User administration service (admin only): listing, role changes,
//! account deletion.

use serde::Deserialize;
use tracing::info;

use crate::error::ApiError;
use crate::services::auth_service::UserDto;
use boutik_core::Role;
use boutik_db::Database;

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserListQuery {
    /// Optional role filter: "user" or "admin".
    pub role: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 500;

// =============================================================================
// Service
// =============================================================================

/// User administration service implementation.
#[derive(Clone)]
pub struct UserService {
    db: Database,
}

impl UserService {
    /// Create a new user administration service.
    pub fn new(db: Database) -> Self {
        UserService { db }
    }

    /// Lists users, newest first, optionally filtered by role.
    pub async fn list(&self, query: UserListQuery) -> Result<(Vec<UserDto>, i64), ApiError> {
        let role = match query.role.as_deref() {
            Some(raw) => Some(
                Role::parse(raw)
                    .ok_or_else(|| ApiError::invalid_input("Role must be 'user' or 'admin'"))?,
            ),
            None => None,
        };

        let page = query.page.unwrap_or(1).max(1);
        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let offset = (page - 1) * limit;

        let users = self.db.users().list(role, limit, offset).await?;
        let total = self.db.users().count(role).await?;

        Ok((users.into_iter().map(UserDto::from).collect(), total))
    }

    /// Gets one user by id.
    pub async fn get(&self, id: &str) -> Result<UserDto, ApiError> {
        let user = self
            .db
            .users()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("User", id))?;

        Ok(user.into())
    }

    /// Changes a user's role. Only "user" and "admin" are recognized.
    pub async fn set_role(&self, id: &str, raw_role: &str) -> Result<UserDto, ApiError> {
        let role = Role::parse(raw_role)
            .ok_or_else(|| ApiError::invalid_input("Role must be 'user' or 'admin'"))?;

        self.db.users().set_role(id, role).await?;

        info!(user_id = %id, role = ?role, "User role changed");

        self.get(id).await
    }

    /// Deletes a user account permanently. Admins cannot delete their own
    /// account; there must always be someone left holding the keys.
    pub async fn delete(&self, id: &str, acting_admin_id: &str) -> Result<(), ApiError> {
        if id == acting_admin_id {
            return Err(ApiError::forbidden("Cannot delete your own account"));
        }

        self.db.users().delete(id).await?;

        info!(user_id = %id, "User deleted");

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtManager;
    use crate::error::ErrorCode;
    use crate::services::auth_service::{AuthService, RegisterRequest};
    use boutik_db::DbConfig;

    async fn setup() -> (UserService, AuthService) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let auth = AuthService::new(db.clone(), JwtManager::new("test-secret".to_string(), 3600));
        (UserService::new(db), auth)
    }

    async fn register(auth: &AuthService, phone: &str) -> String {
        auth.register(RegisterRequest {
            first_name: "Awa".to_string(),
            last_name: "Diop".to_string(),
            phone: phone.to_string(),
            password: "s3cret-pass".to_string(),
        })
        .await
        .unwrap()
        .user
        .id
    }

    #[tokio::test]
    async fn test_list_and_role_filter() {
        let (users, auth) = setup().await;
        let id = register(&auth, "771234567").await;
        register(&auth, "771234568").await;

        users.set_role(&id, "admin").await.unwrap();

        let (all, total) = users.list(UserListQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(total, 2);

        let (admins, admin_total) = users
            .list(UserListQuery {
                role: Some("admin".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(admins.len(), 1);
        assert_eq!(admin_total, 1);
        assert_eq!(admins[0].id, id);
    }

    #[tokio::test]
    async fn test_set_role_rejects_unknown() {
        let (users, auth) = setup().await;
        let id = register(&auth, "771234567").await;

        let err = users.set_role(&id, "superuser").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }

    #[tokio::test]
    async fn test_cannot_delete_self() {
        let (users, auth) = setup().await;
        let id = register(&auth, "771234567").await;

        let err = users.delete(&id, &id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let other = register(&auth, "771234568").await;
        users.delete(&other, &id).await.unwrap();
        let err = users.get(&other).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
