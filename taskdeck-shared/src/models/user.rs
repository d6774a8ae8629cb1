/// User model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     name VARCHAR(255) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     avatar VARCHAR(512),
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskdeck_shared::models::user::{CreateUser, User};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     email: "user@example.com".to_string(),
///     name: "Jess".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
///
/// let found = User::find_by_email(&pool, "user@example.com").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// User account
///
/// Passwords are stored as Argon2id hashes, never in plaintext. The
/// `avatar` column holds an opaque filename managed by external storage.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Email address, unique across all users
    pub email: String,

    /// Display name
    pub name: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Opaque avatar filename, if one has been uploaded
    pub avatar: Option<String>,

    /// Whether the account is active
    pub is_active: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Email address
    pub email: String,

    /// Display name
    pub name: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,
}

/// Input for updating a user profile
///
/// All fields optional; absent fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    /// New display name
    pub name: Option<String>,

    /// New email address
    pub email: Option<String>,

    /// New password hash
    pub password_hash: Option<String>,

    /// New avatar filename (use Some(None) to clear)
    pub avatar: Option<Option<String>>,
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Fails with a unique-constraint violation if the email is taken.
    pub async fn create<'e>(
        db: impl PgExecutor<'e>,
        data: CreateUser,
    ) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, name, password_hash, avatar, is_active, created_at
            "#,
        )
        .bind(data.email)
        .bind(data.name)
        .bind(data.password_hash)
        .fetch_one(db)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID, None if absent
    pub async fn find_by_id<'e>(
        db: impl PgExecutor<'e>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, avatar, is_active, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address, None if absent
    pub async fn find_by_email<'e>(
        db: impl PgExecutor<'e>,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, avatar, is_active, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;

        Ok(user)
    }

    /// Lists users with pagination, newest first
    pub async fn list<'e>(
        db: impl PgExecutor<'e>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, avatar, is_active, created_at
            FROM users
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;

        Ok(users)
    }

    /// Updates a user profile
    ///
    /// Only fields present in `data` are touched. Returns the updated user,
    /// or None if the user doesn't exist.
    ///
    /// # Errors
    ///
    /// Fails with a unique-constraint violation if the new email is taken
    /// by another user.
    pub async fn update<'e>(
        db: impl PgExecutor<'e>,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build the UPDATE dynamically from the fields that are present
        let mut query = String::from("UPDATE users SET id = id");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if data.password_hash.is_some() {
            bind_count += 1;
            query.push_str(&format!(", password_hash = ${}", bind_count));
        }
        if data.avatar.is_some() {
            bind_count += 1;
            query.push_str(&format!(", avatar = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, email, name, password_hash, avatar, is_active, created_at",
        );

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(email) = data.email {
            q = q.bind(email);
        }
        if let Some(password_hash) = data.password_hash {
            q = q.bind(password_hash);
        }
        if let Some(avatar) = data.avatar {
            q = q.bind(avatar);
        }

        let user = q.fetch_optional(db).await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_user_default_is_empty() {
        let update = UpdateUser::default();
        assert!(update.name.is_none());
        assert!(update.email.is_none());
        assert!(update.password_hash.is_none());
        assert!(update.avatar.is_none());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            name: "Test".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            avatar: None,
            is_active: true,
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(json.contains("test@example.com"));
    }

    // Database-backed tests live in the integration suites
}
