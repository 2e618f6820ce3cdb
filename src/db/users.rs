//! Users repository
//!
//! Deleting a user cascades through the user's posts (and their comments) and
//! every comment the user wrote, inside one transaction.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::posts::POST_COLUMNS;
use super::{Page, Paged, PostRecord, Revision, UniqueViolation};

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.password_hash.is_none()
    }

    /// Apply present fields onto a record
    pub fn apply(&self, user: &mut UserRecord) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(password_hash) = &self.password_hash {
            user.password_hash = password_hash.clone();
        }
    }
}

/// Everything removed by a user deletion
#[derive(Debug, Clone)]
pub struct UserDeletion {
    pub user: UserRecord,
    /// Posts authored by the user, as they were before removal
    pub posts: Vec<PostRecord>,
    /// Comments removed (on the user's posts plus the user's own)
    pub comments_removed: u64,
}

// ============================================================================
// Repository
// ============================================================================

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at";

pub struct UsersRepository {
    pool: SqlitePool,
}

impl UsersRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user
    pub async fn create(&self, user: CreateUser) -> Result<UserRecord> {
        let now = Utc::now();
        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.name)
        .bind(&record.email)
        .bind(&record.password_hash)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| UniqueViolation::check("users.email", e))?;

        Ok(record)
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: &str) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    /// Get user by email (case-insensitive)
    pub async fn get_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ? COLLATE NOCASE"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    /// List users in creation order
    pub async fn list(&self, page: Page) -> Result<Paged<UserRecord>> {
        let (total,) = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        let items = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id LIMIT ? OFFSET ?"
        ))
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(Paged { items, total })
    }

    /// Update user, returning the record before and after the change
    pub async fn update(&self, id: &str, update: UpdateUser) -> Result<Option<Revision<UserRecord>>> {
        let mut tx = self.pool.begin().await?;

        let Some(before) = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };

        let mut after = before.clone();
        update.apply(&mut after);
        if !update.is_empty() {
            after.updated_at = Utc::now();
        }

        sqlx::query(
            "UPDATE users SET name = ?, email = ?, password_hash = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&after.name)
        .bind(&after.email)
        .bind(&after.password_hash)
        .bind(after.updated_at)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| UniqueViolation::check("users.email", e))?;

        tx.commit().await?;
        Ok(Some(Revision { before, after }))
    }

    /// Delete a user together with everything they authored
    pub async fn delete_cascade(&self, id: &str) -> Result<Option<UserDeletion>> {
        let mut tx = self.pool.begin().await?;

        let Some(user) = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };

        let posts = sqlx::query_as::<_, PostRecord>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE author_id = ? ORDER BY created_at, id"
        ))
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let on_own_posts = sqlx::query(
            "DELETE FROM comments WHERE post_id IN (SELECT id FROM posts WHERE author_id = ?)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query("DELETE FROM posts WHERE author_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let own_comments = sqlx::query("DELETE FROM comments WHERE user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(UserDeletion {
            user,
            posts,
            comments_removed: on_own_posts + own_comments,
        }))
    }
}
