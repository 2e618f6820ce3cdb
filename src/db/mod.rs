//! Database connection and operations
//!
//! Resolvers and services only ever see the [`Store`] trait. [`Database`] is the
//! SQLite implementation; [`MemoryStore`] keeps everything in process and backs
//! the test suite and `DATABASE_URL=memory`.

pub mod comments;
pub mod memory;
pub mod posts;
pub mod seed;
pub mod store;
pub mod users;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub use comments::{CommentFilter, CommentRecord, CommentsRepository, CreateComment, UpdateComment};
pub use memory::MemoryStore;
pub use posts::{
    CreatePost, PostDeletion, PostFilter, PostRecord, PostVisibility, PostsRepository, UpdatePost,
};
pub use store::{Store, StoreRef};
pub use users::{CreateUser, UpdateUser, UserDeletion, UserRecord, UsersRepository};

/// Offset/limit window into a list query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: i64,
    pub limit: i64,
}

impl Page {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self { offset, limit }
    }

    /// Every row; used by nested resolvers that are not paginated
    pub fn all() -> Self {
        Self {
            offset: 0,
            limit: i64::MAX,
        }
    }
}

/// One page of results plus the total number of matching rows
#[derive(Debug, Clone)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: i64,
}

/// State of a record immediately before and after an update
#[derive(Debug, Clone, PartialEq)]
pub struct Revision<T> {
    pub before: T,
    pub after: T,
}

/// A write collided with a unique column, named as `table.column`
#[derive(Debug, thiserror::Error)]
#[error("UNIQUE constraint failed: {0}")]
pub struct UniqueViolation(pub &'static str);

impl UniqueViolation {
    /// Wrap a driver error, recognising SQLite unique constraint failures
    pub(crate) fn check(column: &'static str, err: sqlx::Error) -> anyhow::Error {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => Self(column).into(),
            _ => err.into(),
        }
    }
}

/// Database wrapper providing connection pool access
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection pool
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("Invalid database URL: {}", url))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        Ok(Self { pool })
    }

    /// Private in-memory SQLite database with migrations applied
    ///
    /// Uses a single connection that is never recycled; a second connection
    /// would see a different, empty database.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get a users repository
    pub fn users(&self) -> UsersRepository {
        UsersRepository::new(self.pool.clone())
    }

    /// Get a posts repository
    pub fn posts(&self) -> PostsRepository {
        PostsRepository::new(self.pool.clone())
    }

    /// Get a comments repository
    pub fn comments(&self) -> CommentsRepository {
        CommentsRepository::new(self.pool.clone())
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Open the store named by `url`: `memory` for the in-process store,
/// anything else is treated as an SQLite URL and migrated on connect.
pub async fn open_store(url: &str, max_connections: u32) -> Result<StoreRef> {
    if url == "memory" {
        tracing::info!("Using in-memory store");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let db = Database::connect(url, max_connections).await?;
    db.migrate().await.context("Failed to run migrations")?;
    tracing::info!(url = %url, "SQLite store ready");
    Ok(Arc::new(db))
}
