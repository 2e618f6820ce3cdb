//! Comments repository

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use super::{Page, Paged, Revision};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommentRecord {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateComment {
    pub post_id: String,
    pub user_id: String,
    pub content: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateComment {
    pub content: Option<String>,
}

impl UpdateComment {
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
    }

    pub fn apply(&self, comment: &mut CommentRecord) {
        if let Some(content) = &self.content {
            comment.content = content.clone();
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommentFilter {
    pub post_id: Option<String>,
    pub user_id: Option<String>,
}

impl CommentFilter {
    pub fn for_post(post_id: impl Into<String>) -> Self {
        Self {
            post_id: Some(post_id.into()),
            user_id: None,
        }
    }

    pub fn by_user(user_id: impl Into<String>) -> Self {
        Self {
            post_id: None,
            user_id: Some(user_id.into()),
        }
    }

    pub fn matches(&self, comment: &CommentRecord) -> bool {
        self.post_id.as_ref().is_none_or(|id| &comment.post_id == id)
            && self.user_id.as_ref().is_none_or(|id| &comment.user_id == id)
    }

    fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" WHERE 1 = 1");
        if let Some(post_id) = &self.post_id {
            qb.push(" AND post_id = ").push_bind(post_id.clone());
        }
        if let Some(user_id) = &self.user_id {
            qb.push(" AND user_id = ").push_bind(user_id.clone());
        }
    }
}

const COMMENT_COLUMNS: &str = "id, post_id, user_id, content, created_at, updated_at";

pub struct CommentsRepository {
    pool: SqlitePool,
}

impl CommentsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new comment
    pub async fn create(&self, comment: CreateComment) -> Result<CommentRecord> {
        let now = Utc::now();
        let record = CommentRecord {
            id: Uuid::new_v4().to_string(),
            post_id: comment.post_id,
            user_id: comment.user_id,
            content: comment.content,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO comments (id, post_id, user_id, content, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.post_id)
        .bind(&record.user_id)
        .bind(&record.content)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    /// Get comment by ID
    pub async fn get_by_id(&self, id: &str) -> Result<Option<CommentRecord>> {
        let record = sqlx::query_as::<_, CommentRecord>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    /// List comments matching a filter, oldest first
    pub async fn list(&self, filter: &CommentFilter, page: Page) -> Result<Paged<CommentRecord>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM comments");
        filter.push_where(&mut count);
        let (total,) = count
            .build_query_as::<(i64,)>()
            .fetch_one(&self.pool)
            .await?;

        let mut select =
            QueryBuilder::<Sqlite>::new(format!("SELECT {COMMENT_COLUMNS} FROM comments"));
        filter.push_where(&mut select);
        select
            .push(" ORDER BY created_at, id LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);
        let items = select
            .build_query_as::<CommentRecord>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Paged { items, total })
    }

    /// Update comment, returning the record before and after the change
    pub async fn update(
        &self,
        id: &str,
        update: UpdateComment,
    ) -> Result<Option<Revision<CommentRecord>>> {
        let mut tx = self.pool.begin().await?;

        let Some(before) = sqlx::query_as::<_, CommentRecord>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?"
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

        sqlx::query("UPDATE comments SET content = ?, updated_at = ? WHERE id = ?")
            .bind(&after.content)
            .bind(after.updated_at)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(Revision { before, after }))
    }

    /// Delete a single comment, returning it
    pub async fn delete(&self, id: &str) -> Result<Option<CommentRecord>> {
        let record = sqlx::query_as::<_, CommentRecord>(&format!(
            "DELETE FROM comments WHERE id = ? RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }
}
