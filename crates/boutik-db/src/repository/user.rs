//! # User Repository
//!
//! Database operations for the `users` collection.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use boutik_core::{Role, User};

/// Row shape of the `users` table.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    first_name: String,
    last_name: String,
    phone: String,
    password_hash: String,
    role: Role,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone,
            password_hash: self.password_hash,
            role: self.role,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const SELECT_COLUMNS: &str = "SELECT id, first_name, last_name, phone, password_hash, \
     role, active, created_at, updated_at FROM users";

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a new user.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - phone number already registered
    pub async fn insert(&self, user: &User) -> DbResult<()> {
        debug!(id = %user.id, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (
                id, first_name, last_name, phone, password_hash,
                role, active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a user by id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!("{} WHERE id = ?1", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(UserRow::into_user))
    }

    /// Looks a user up by any of the given phone spellings.
    ///
    /// Login accepts a number with or without the `+221` country prefix,
    /// so the lookup probes both variants.
    pub async fn get_by_phone_variants(&self, variants: &[String]) -> DbResult<Option<User>> {
        for phone in variants {
            let row: Option<UserRow> =
                sqlx::query_as(&format!("{} WHERE phone = ?1", SELECT_COLUMNS))
                    .bind(phone)
                    .fetch_optional(&self.pool)
                    .await?;

            if let Some(row) = row {
                return Ok(Some(row.into_user()));
            }
        }
        Ok(None)
    }

    /// Lists users, newest first, optionally filtered by role.
    pub async fn list(
        &self,
        role: Option<Role>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<User>> {
        let rows: Vec<UserRow> = match role {
            Some(role) => {
                sqlx::query_as(&format!(
                    "{} WHERE role = ?1 ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
                    SELECT_COLUMNS
                ))
                .bind(role)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(&format!(
                    "{} ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
                    SELECT_COLUMNS
                ))
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(UserRow::into_user).collect())
    }

    /// Counts users, optionally filtered by role.
    pub async fn count(&self, role: Option<Role>) -> DbResult<i64> {
        let count: i64 = match role {
            Some(role) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = ?1")
                    .bind(role)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM users")
                    .fetch_one(&self.pool)
                    .await?
            }
        };

        Ok(count)
    }

    /// Changes a user's role.
    pub async fn set_role(&self, id: &str, role: Role) -> DbResult<()> {
        debug!(id = %id, "Changing user role");

        let result = sqlx::query("UPDATE users SET role = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(role)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    /// Deletes a user account permanently.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting user");

        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
