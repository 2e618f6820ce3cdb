//! In-process store
//!
//! Rows live in insertion-ordered vectors behind one `RwLock`, so every trait
//! operation (cascades included) happens under a single write lock.

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{
    CommentFilter, CommentRecord, CreateComment, CreatePost, CreateUser, Page, Paged,
    PostDeletion, PostFilter, PostRecord, Revision, Store, UniqueViolation, UpdateComment,
    UpdatePost, UpdateUser, UserDeletion, UserRecord,
};

#[derive(Default)]
struct Tables {
    users: Vec<UserRecord>,
    posts: Vec<PostRecord>,
    comments: Vec<CommentRecord>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn paginate<T: Clone>(rows: Vec<&T>, page: Page) -> Paged<T> {
    let total = rows.len() as i64;
    let items = rows
        .into_iter()
        .skip(page.offset.max(0) as usize)
        .take(page.limit.max(0) as usize)
        .cloned()
        .collect();
    Paged { items, total }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn find_user(&self, id: &str) -> Result<Option<UserRecord>> {
        let tables = self.tables.read();
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let tables = self.tables.read();
        Ok(tables
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list_users(&self, page: Page) -> Result<Paged<UserRecord>> {
        let tables = self.tables.read();
        Ok(paginate(tables.users.iter().collect(), page))
    }

    async fn create_user(&self, user: CreateUser) -> Result<UserRecord> {
        let mut tables = self.tables.write();
        if tables
            .users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(UniqueViolation("users.email").into());
        }
        let now = Utc::now();
        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(record.clone());
        Ok(record)
    }

    async fn update_user(
        &self,
        id: &str,
        update: UpdateUser,
    ) -> Result<Option<Revision<UserRecord>>> {
        let mut tables = self.tables.write();
        if let Some(email) = &update.email
            && tables
                .users
                .iter()
                .any(|u| u.id != id && u.email.eq_ignore_ascii_case(email))
        {
            return Err(UniqueViolation("users.email").into());
        }
        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        let before = user.clone();
        update.apply(user);
        if !update.is_empty() {
            user.updated_at = Utc::now();
        }
        Ok(Some(Revision {
            before,
            after: user.clone(),
        }))
    }

    async fn delete_user(&self, id: &str) -> Result<Option<UserDeletion>> {
        let mut tables = self.tables.write();
        let Some(index) = tables.users.iter().position(|u| u.id == id) else {
            return Ok(None);
        };

        let posts: Vec<PostRecord> = tables
            .posts
            .iter()
            .filter(|p| p.author_id == id)
            .cloned()
            .collect();

        let before = tables.comments.len();
        tables
            .comments
            .retain(|c| c.user_id != id && !posts.iter().any(|p| p.id == c.post_id));
        let comments_removed = (before - tables.comments.len()) as u64;

        tables.posts.retain(|p| p.author_id != id);
        let user = tables.users.remove(index);

        Ok(Some(UserDeletion {
            user,
            posts,
            comments_removed,
        }))
    }

    async fn find_post(&self, id: &str) -> Result<Option<PostRecord>> {
        let tables = self.tables.read();
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn list_posts(&self, filter: &PostFilter, page: Page) -> Result<Paged<PostRecord>> {
        let tables = self.tables.read();
        Ok(paginate(
            tables.posts.iter().filter(|p| filter.matches(p)).collect(),
            page,
        ))
    }

    async fn create_post(&self, post: CreatePost) -> Result<PostRecord> {
        let mut tables = self.tables.write();
        if !tables.users.iter().any(|u| u.id == post.author_id) {
            bail!("FOREIGN KEY constraint failed: posts.author_id");
        }
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
        tables.posts.push(record.clone());
        Ok(record)
    }

    async fn update_post(
        &self,
        id: &str,
        update: UpdatePost,
    ) -> Result<Option<Revision<PostRecord>>> {
        let mut tables = self.tables.write();
        let Some(post) = tables.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        let before = post.clone();
        update.apply(post);
        if !update.is_empty() {
            post.updated_at = Utc::now();
        }
        Ok(Some(Revision {
            before,
            after: post.clone(),
        }))
    }

    async fn delete_post(&self, id: &str) -> Result<Option<PostDeletion>> {
        let mut tables = self.tables.write();
        let Some(index) = tables.posts.iter().position(|p| p.id == id) else {
            return Ok(None);
        };
        let before = tables.comments.len();
        tables.comments.retain(|c| c.post_id != id);
        let comments_removed = (before - tables.comments.len()) as u64;
        let post = tables.posts.remove(index);
        Ok(Some(PostDeletion {
            post,
            comments_removed,
        }))
    }

    async fn find_comment(&self, id: &str) -> Result<Option<CommentRecord>> {
        let tables = self.tables.read();
        Ok(tables.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn list_comments(
        &self,
        filter: &CommentFilter,
        page: Page,
    ) -> Result<Paged<CommentRecord>> {
        let tables = self.tables.read();
        Ok(paginate(
            tables.comments.iter().filter(|c| filter.matches(c)).collect(),
            page,
        ))
    }

    async fn create_comment(&self, comment: CreateComment) -> Result<CommentRecord> {
        let mut tables = self.tables.write();
        if !tables.posts.iter().any(|p| p.id == comment.post_id) {
            bail!("FOREIGN KEY constraint failed: comments.post_id");
        }
        if !tables.users.iter().any(|u| u.id == comment.user_id) {
            bail!("FOREIGN KEY constraint failed: comments.user_id");
        }
        let now = Utc::now();
        let record = CommentRecord {
            id: Uuid::new_v4().to_string(),
            post_id: comment.post_id,
            user_id: comment.user_id,
            content: comment.content,
            created_at: now,
            updated_at: now,
        };
        tables.comments.push(record.clone());
        Ok(record)
    }

    async fn update_comment(
        &self,
        id: &str,
        update: UpdateComment,
    ) -> Result<Option<Revision<CommentRecord>>> {
        let mut tables = self.tables.write();
        let Some(comment) = tables.comments.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        let before = comment.clone();
        update.apply(comment);
        if !update.is_empty() {
            comment.updated_at = Utc::now();
        }
        Ok(Some(Revision {
            before,
            after: comment.clone(),
        }))
    }

    async fn delete_comment(&self, id: &str) -> Result<Option<CommentRecord>> {
        let mut tables = self.tables.write();
        let index = tables.comments.iter().position(|c| c.id == id);
        Ok(index.map(|i| tables.comments.remove(i)))
    }
}
