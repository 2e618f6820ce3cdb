//! Posts repository

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use super::{Page, Paged, Revision};

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostRecord {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub content: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostRecord {
    /// Whether `viewer` may read this post
    pub fn is_visible_to(&self, viewer: Option<&str>) -> bool {
        self.published || viewer == Some(self.author_id.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct CreatePost {
    pub author_id: String,
    pub title: String,
    pub content: String,
    pub published: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UpdatePost {
    pub title: Option<String>,
    pub content: Option<String>,
    pub published: Option<bool>,
}

impl UpdatePost {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.published.is_none()
    }

    /// Apply present fields onto a record
    pub fn apply(&self, post: &mut PostRecord) {
        if let Some(title) = &self.title {
            post.title = title.clone();
        }
        if let Some(content) = &self.content {
            post.content = content.clone();
        }
        if let Some(published) = self.published {
            post.published = published;
        }
    }
}

/// Which posts a query may return
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PostVisibility {
    #[default]
    All,
    Published,
    /// Published posts plus every post authored by this user
    PublishedOrOwnedBy(String),
}

impl PostVisibility {
    pub fn for_viewer(viewer: Option<&str>) -> Self {
        match viewer {
            Some(id) => Self::PublishedOrOwnedBy(id.to_string()),
            None => Self::Published,
        }
    }

    pub fn allows(&self, post: &PostRecord) -> bool {
        match self {
            Self::All => true,
            Self::Published => post.published,
            Self::PublishedOrOwnedBy(id) => post.published || &post.author_id == id,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub author_id: Option<String>,
    pub published: Option<bool>,
    pub visibility: PostVisibility,
    /// Matches posts whose title or content contains the term
    pub search: Option<String>,
}

impl PostFilter {
    pub fn matches(&self, post: &PostRecord) -> bool {
        if let Some(author_id) = &self.author_id
            && &post.author_id != author_id
        {
            return false;
        }
        if let Some(published) = self.published
            && post.published != published
        {
            return false;
        }
        if !self.visibility.allows(post) {
            return false;
        }
        match &self.search {
            // ASCII-only folding, the same as SQLite's LIKE
            Some(term) => {
                let term = term.to_ascii_lowercase();
                post.title.to_ascii_lowercase().contains(&term)
                    || post.content.to_ascii_lowercase().contains(&term)
            }
            None => true,
        }
    }

    fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" WHERE 1 = 1");
        if let Some(author_id) = &self.author_id {
            qb.push(" AND author_id = ").push_bind(author_id.clone());
        }
        if let Some(published) = self.published {
            qb.push(" AND published = ").push_bind(published);
        }
        match &self.visibility {
            PostVisibility::All => {}
            PostVisibility::Published => {
                qb.push(" AND published = 1");
            }
            PostVisibility::PublishedOrOwnedBy(id) => {
                qb.push(" AND (published = 1 OR author_id = ")
                    .push_bind(id.clone())
                    .push(")");
            }
        }
        if let Some(term) = &self.search {
            let pattern = like_pattern(term);
            qb.push(" AND (title LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR content LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }
    }
}

/// Substring pattern for `LIKE ... ESCAPE '\'` with the term's wildcards escaped
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// A post removed together with its comments
#[derive(Debug, Clone)]
pub struct PostDeletion {
    pub post: PostRecord,
    pub comments_removed: u64,
}

// ============================================================================
// Repository
// ============================================================================

pub(crate) const POST_COLUMNS: &str =
    "id, author_id, title, content, published, created_at, updated_at";

pub struct PostsRepository {
    pool: SqlitePool,
}

impl PostsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new post
    pub async fn create(&self, post: CreatePost) -> Result<PostRecord> {
        let now = Utc::now();
        let record = PostRecord {
            id: Uuid::new_v4().to_string(),
            author_id: post.author_id,
            title: post.title,
            content: post.content,
            published: post.published,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO posts (id, author_id, title, content, published, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.author_id)
        .bind(&record.title)
        .bind(&record.content)
        .bind(record.published)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    /// Get post by ID
    pub async fn get_by_id(&self, id: &str) -> Result<Option<PostRecord>> {
        let record = sqlx::query_as::<_, PostRecord>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    /// List posts matching a filter, oldest first
    pub async fn list(&self, filter: &PostFilter, page: Page) -> Result<Paged<PostRecord>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM posts");
        filter.push_where(&mut count);
        let (total,) = count
            .build_query_as::<(i64,)>()
            .fetch_one(&self.pool)
            .await?;

        let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {POST_COLUMNS} FROM posts"));
        filter.push_where(&mut select);
        select
            .push(" ORDER BY created_at, id LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);
        let items = select
            .build_query_as::<PostRecord>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Paged { items, total })
    }

    /// Update post, returning the record before and after the change
    pub async fn update(&self, id: &str, update: UpdatePost) -> Result<Option<Revision<PostRecord>>> {
        let mut tx = self.pool.begin().await?;

        let Some(before) = sqlx::query_as::<_, PostRecord>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = ?"
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
            "UPDATE posts SET title = ?, content = ?, published = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&after.title)
        .bind(&after.content)
        .bind(after.published)
        .bind(after.updated_at)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(Revision { before, after }))
    }

    /// Delete a post and all of its comments
    pub async fn delete_cascade(&self, id: &str) -> Result<Option<PostDeletion>> {
        let mut tx = self.pool.begin().await?;

        let Some(post) = sqlx::query_as::<_, PostRecord>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };

        let comments_removed = sqlx::query("DELETE FROM comments WHERE post_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(PostDeletion {
            post,
            comments_removed,
        }))
    }
}
