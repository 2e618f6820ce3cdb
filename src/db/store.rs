//! Storage seam used by services and resolvers
//!
//! Every single-entity operation is atomic. Updates hand back the
//! before/after pair read inside the same transaction, and cascading deletes
//! either remove everything or nothing.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use super::{
    CommentFilter, CommentRecord, CreateComment, CreatePost, CreateUser, Database, Page, Paged,
    PostDeletion, PostFilter, PostRecord, Revision, UpdateComment, UpdatePost, UpdateUser,
    UserDeletion, UserRecord,
};

pub type StoreRef = Arc<dyn Store>;

#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap connectivity check for readiness probes
    async fn ping(&self) -> Result<()>;

    async fn find_user(&self, id: &str) -> Result<Option<UserRecord>>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>>;
    async fn list_users(&self, page: Page) -> Result<Paged<UserRecord>>;
    async fn create_user(&self, user: CreateUser) -> Result<UserRecord>;
    async fn update_user(&self, id: &str, update: UpdateUser)
    -> Result<Option<Revision<UserRecord>>>;
    /// Remove the user, their posts (with those posts' comments) and their comments
    async fn delete_user(&self, id: &str) -> Result<Option<UserDeletion>>;

    async fn find_post(&self, id: &str) -> Result<Option<PostRecord>>;
    async fn list_posts(&self, filter: &PostFilter, page: Page) -> Result<Paged<PostRecord>>;
    async fn create_post(&self, post: CreatePost) -> Result<PostRecord>;
    async fn update_post(&self, id: &str, update: UpdatePost)
    -> Result<Option<Revision<PostRecord>>>;
    /// Remove the post's comments, then the post
    async fn delete_post(&self, id: &str) -> Result<Option<PostDeletion>>;

    async fn find_comment(&self, id: &str) -> Result<Option<CommentRecord>>;
    async fn list_comments(&self, filter: &CommentFilter, page: Page) -> Result<Paged<CommentRecord>>;
    async fn create_comment(&self, comment: CreateComment) -> Result<CommentRecord>;
    async fn update_comment(
        &self,
        id: &str,
        update: UpdateComment,
    ) -> Result<Option<Revision<CommentRecord>>>;
    async fn delete_comment(&self, id: &str) -> Result<Option<CommentRecord>>;
}

#[async_trait]
impl Store for Database {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(self.pool()).await?;
        Ok(())
    }

    async fn find_user(&self, id: &str) -> Result<Option<UserRecord>> {
        self.users().get_by_id(id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        self.users().get_by_email(email).await
    }

    async fn list_users(&self, page: Page) -> Result<Paged<UserRecord>> {
        self.users().list(page).await
    }

    async fn create_user(&self, user: CreateUser) -> Result<UserRecord> {
        self.users().create(user).await
    }

    async fn update_user(
        &self,
        id: &str,
        update: UpdateUser,
    ) -> Result<Option<Revision<UserRecord>>> {
        self.users().update(id, update).await
    }

    async fn delete_user(&self, id: &str) -> Result<Option<UserDeletion>> {
        self.users().delete_cascade(id).await
    }

    async fn find_post(&self, id: &str) -> Result<Option<PostRecord>> {
        self.posts().get_by_id(id).await
    }

    async fn list_posts(&self, filter: &PostFilter, page: Page) -> Result<Paged<PostRecord>> {
        self.posts().list(filter, page).await
    }

    async fn create_post(&self, post: CreatePost) -> Result<PostRecord> {
        self.posts().create(post).await
    }

    async fn update_post(
        &self,
        id: &str,
        update: UpdatePost,
    ) -> Result<Option<Revision<PostRecord>>> {
        self.posts().update(id, update).await
    }

    async fn delete_post(&self, id: &str) -> Result<Option<PostDeletion>> {
        self.posts().delete_cascade(id).await
    }

    async fn find_comment(&self, id: &str) -> Result<Option<CommentRecord>> {
        self.comments().get_by_id(id).await
    }

    async fn list_comments(&self, filter: &CommentFilter, page: Page) -> Result<Paged<CommentRecord>> {
        self.comments().list(filter, page).await
    }

    async fn create_comment(&self, comment: CreateComment) -> Result<CommentRecord> {
        self.comments().create(comment).await
    }

    async fn update_comment(
        &self,
        id: &str,
        update: UpdateComment,
    ) -> Result<Option<Revision<CommentRecord>>> {
        self.comments().update(id, update).await
    }

    async fn delete_comment(&self, id: &str) -> Result<Option<CommentRecord>> {
        self.comments().delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{PostVisibility, UniqueViolation};
    use pretty_assertions::assert_eq;

    async fn seeded() -> (Database, UserRecord) {
        let db = Database::connect_in_memory().await.unwrap();
        let user = db
            .create_user(CreateUser {
                name: "khalil".into(),
                email: "khalil@example.com".into(),
                password_hash: "x".into(),
            })
            .await
            .unwrap();
        (db, user)
    }

    fn post_for(author: &UserRecord, title: &str, published: bool) -> CreatePost {
        CreatePost {
            author_id: author.id.clone(),
            title: title.into(),
            content: format!("{} content", title),
            published,
        }
    }

    #[tokio::test]
    async fn test_update_post_returns_revision() {
        let (db, user) = seeded().await;
        let post = db.create_post(post_for(&user, "graphql", false)).await.unwrap();

        let revision = db
            .update_post(
                &post.id,
                UpdatePost {
                    published: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert!(!revision.before.published);
        assert!(revision.after.published);
        assert_eq!(revision.after.title, "graphql");
        assert_eq!(db.find_post(&post.id).await.unwrap().unwrap().published, true);
    }

    #[tokio::test]
    async fn test_update_missing_post_is_none() {
        let (db, _) = seeded().await;
        let result = db.update_post("nope", UpdatePost::default()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_post_filter_visibility_and_search() {
        let (db, user) = seeded().await;
        let other = db
            .create_user(CreateUser {
                name: "wissem".into(),
                email: "wissem@example.com".into(),
                password_hash: "x".into(),
            })
            .await
            .unwrap();
        db.create_post(post_for(&user, "graphql", true)).await.unwrap();
        db.create_post(post_for(&user, "draft", false)).await.unwrap();
        db.create_post(post_for(&other, "nodejs", false)).await.unwrap();

        let filter = PostFilter {
            visibility: PostVisibility::for_viewer(Some(&user.id)),
            ..Default::default()
        };
        let visible = db.list_posts(&filter, Page::all()).await.unwrap();
        assert_eq!(visible.total, 2);

        let anonymous = PostFilter {
            visibility: PostVisibility::for_viewer(None),
            ..Default::default()
        };
        assert_eq!(db.list_posts(&anonymous, Page::all()).await.unwrap().total, 1);

        let search = PostFilter {
            search: Some("node".into()),
            ..Default::default()
        };
        let found = db.list_posts(&search, Page::all()).await.unwrap();
        assert_eq!(found.items.len(), 1);
        assert_eq!(found.items[0].title, "nodejs");
    }

    #[tokio::test]
    async fn test_delete_post_cascades_comments() {
        let (db, user) = seeded().await;
        let post = db.create_post(post_for(&user, "graphql", true)).await.unwrap();
        for i in 0..3 {
            db.create_comment(CreateComment {
                post_id: post.id.clone(),
                user_id: user.id.clone(),
                content: format!("comment {}", i),
            })
            .await
            .unwrap();
        }

        let deletion = db.delete_post(&post.id).await.unwrap().unwrap();
        assert_eq!(deletion.comments_removed, 3);
        assert_eq!(deletion.post, post);

        let remaining = db
            .list_comments(&CommentFilter::for_post(&post.id), Page::all())
            .await
            .unwrap();
        assert_eq!(remaining.total, 0);
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let (db, user) = seeded().await;
        let other = db
            .create_user(CreateUser {
                name: "wissem".into(),
                email: "wissem@example.com".into(),
                password_hash: "x".into(),
            })
            .await
            .unwrap();
        let own = db.create_post(post_for(&user, "graphql", true)).await.unwrap();
        let foreign = db.create_post(post_for(&other, "nodejs", true)).await.unwrap();
        db.create_comment(CreateComment {
            post_id: own.id.clone(),
            user_id: other.id.clone(),
            content: "nice".into(),
        })
        .await
        .unwrap();
        db.create_comment(CreateComment {
            post_id: foreign.id.clone(),
            user_id: user.id.clone(),
            content: "like nodejs".into(),
        })
        .await
        .unwrap();

        let deletion = db.delete_user(&user.id).await.unwrap().unwrap();
        assert_eq!(deletion.posts, vec![own.clone()]);
        assert_eq!(deletion.comments_removed, 2);

        assert!(db.find_user(&user.id).await.unwrap().is_none());
        assert!(db.find_post(&own.id).await.unwrap().is_none());
        assert!(db.find_post(&foreign.id).await.unwrap().is_some());
        let left = db.list_comments(&CommentFilter::default(), Page::all()).await.unwrap();
        assert_eq!(left.total, 0);
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally_in_both_stores() {
        let sqlite: StoreRef = Arc::new(Database::connect_in_memory().await.unwrap());
        let memory: StoreRef = Arc::new(crate::db::MemoryStore::new());

        for store in [sqlite, memory] {
            let user = store
                .create_user(CreateUser {
                    name: "khalil".into(),
                    email: "khalil@example.com".into(),
                    password_hash: "x".into(),
                })
                .await
                .unwrap();
            for title in ["50% off", "500 posts", "snake_case", "snakeXcase"] {
                store.create_post(post_for(&user, title, true)).await.unwrap();
            }

            let search = |term: &str| PostFilter {
                search: Some(term.into()),
                ..Default::default()
            };
            let found = store.list_posts(&search("50%"), Page::all()).await.unwrap();
            assert_eq!(found.total, 1);
            assert_eq!(found.items[0].title, "50% off");

            let found = store.list_posts(&search("E_C"), Page::all()).await.unwrap();
            assert_eq!(found.total, 1);
            assert_eq!(found.items[0].title, "snake_case");
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_is_unique_violation() {
        let (db, user) = seeded().await;
        let err = db
            .create_user(CreateUser {
                name: "khalil again".into(),
                email: "Khalil@Example.com".into(),
                password_hash: "x".into(),
            })
            .await
            .unwrap_err();
        assert!(err.is::<UniqueViolation>());

        let other = db
            .create_user(CreateUser {
                name: "wissem".into(),
                email: "wissem@example.com".into(),
                password_hash: "x".into(),
            })
            .await
            .unwrap();
        let steal = UpdateUser {
            email: Some(user.email.clone()),
            ..Default::default()
        };
        let err = db.update_user(&other.id, steal).await.unwrap_err();
        assert!(err.is::<UniqueViolation>());
    }
}
