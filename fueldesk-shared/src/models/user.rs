/// User model and database operations
///
/// Accounts are keyed by mobile number (`username`). Staff accounts may log
/// into the admin console; superusers may use every GraphQL operation.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(100) NOT NULL,
///     username VARCHAR(10) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     authorisation VARCHAR(100) NOT NULL DEFAULT '',
///     is_staff BOOLEAN NOT NULL DEFAULT FALSE,
///     is_superuser BOOLEAN NOT NULL DEFAULT FALSE,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

const COLUMNS: &str = "id, name, username, password_hash, authorisation, is_staff, \
                       is_superuser, is_active, created_at, updated_at, last_login_at";

/// Columns matched by free-text search in the admin changelist
pub const SEARCH_FIELDS: &[&str] = &["name", "username", "authorisation"];

/// User account row
///
/// Passwords are stored as Argon2id hashes, never in plaintext, and the hash
/// is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,

    /// Display name
    pub name: String,

    /// Mobile number, unique across all users
    pub username: String,

    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Free-form note describing what the account is allowed to do
    pub authorisation: String,

    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for creating a user (password already hashed)
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub username: String,
    pub password_hash: String,
    pub authorisation: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Input for replacing a user's editable fields
///
/// `password_hash` is only written when present.
#[derive(Debug, Clone)]
pub struct UpdateUser {
    pub name: String,
    pub username: String,
    pub authorisation: String,
    pub password_hash: Option<String>,
}

/// Exact-match filters for listing users
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub id: Option<i64>,
    pub username: Option<String>,

    /// Hide staff accounts (GraphQL `users` query)
    pub exclude_staff: bool,

    /// Hide superusers (admin changelist)
    pub exclude_superusers: bool,

    /// Free-text search over [`SEARCH_FIELDS`]
    pub search: Option<String>,
}

impl UserFilter {
    fn push_where<'a>(&self, qb: &mut QueryBuilder<'a, Postgres>) {
        qb.push(" WHERE TRUE");
        if let Some(id) = self.id {
            qb.push(" AND id = ").push_bind(id);
        }
        if let Some(username) = &self.username {
            qb.push(" AND username = ").push_bind(username.clone());
        }
        if self.exclude_staff {
            qb.push(" AND is_staff = FALSE");
        }
        if self.exclude_superusers {
            qb.push(" AND is_superuser = FALSE");
        }
        if let Some(term) = &self.search {
            super::push_search(qb, SEARCH_FIELDS, term);
        }
    }
}

impl User {
    /// Inserts a new user
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on `users_username_key` if the mobile
    /// number is taken.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (name, username, password_hash, authorisation, is_staff, is_superuser)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(data.name)
            .bind(data.username)
            .bind(data.password_hash)
            .bind(data.authorisation)
            .bind(data.is_staff)
            .bind(data.is_superuser)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE username = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Replaces name, username and authorisation; swaps the password hash
    /// only when a new one is supplied. Bumps `updated_at`.
    ///
    /// Returns `None` if the user doesn't exist.
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE users
             SET name = $2,
                 username = $3,
                 authorisation = $4,
                 password_hash = COALESCE($5, password_hash),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(data.name)
            .bind(data.username)
            .bind(data.authorisation)
            .bind(data.password_hash)
            .fetch_optional(pool)
            .await
    }

    /// Deletes a user, returning whether a row was removed
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Records a successful login
    pub async fn update_last_login(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists users matching `filter`, ordered by id
    pub async fn list(
        pool: &PgPool,
        filter: &UserFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM users"));
        filter.push_where(&mut qb);
        qb.push(" ORDER BY id LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        qb.build_query_as::<User>().fetch_all(pool).await
    }

    /// Counts users matching `filter`
    pub async fn count(pool: &PgPool, filter: &UserFilter) -> Result<i64, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        filter.push_where(&mut qb);

        qb.build_query_scalar::<i64>().fetch_one(pool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 7,
            name: "Asha".to_string(),
            username: "9876543210".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            authorisation: "night shift".to_string(),
            is_staff: false,
            is_superuser: false,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "9876543210");
    }

    #[test]
    fn test_filter_builds_exact_matches() {
        let filter = UserFilter {
            id: Some(3),
            username: Some("9876543210".to_string()),
            exclude_staff: true,
            ..Default::default()
        };

        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        filter.push_where(&mut qb);
        let sql = qb.sql();

        assert!(sql.contains("id = $1"));
        assert!(sql.contains("username = $2"));
        assert!(sql.contains("is_staff = FALSE"));
        assert!(!sql.contains("is_superuser"));
    }
}
