//! GraphQL types for the API

use async_graphql::{ComplexObject, Context, Enum, InputObject, Result, SimpleObject};

use crate::db::{
    CommentFilter, CommentRecord, Page, PostFilter, PostRecord, PostVisibility, StoreRef,
    UpdatePost, UserRecord,
};
use crate::define_connection;
use crate::error::GraphqlResultExt;
use crate::pubsub::{CommentEvent, MutationKind, PostEvent};
use crate::services::{EditUser, NewPost, RegisterUser, Services, Session};

use super::auth::AuthExt;

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Clone, SimpleObject)]
#[graphql(complex)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<UserRecord> for User {
    fn from(r: UserRecord) -> Self {
        Self {
            id: r.id,
            name: r.name,
            email: r.email,
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.to_rfc3339(),
        }
    }
}

#[ComplexObject]
impl User {
    /// Posts written by this user that the caller may see
    async fn posts(&self, ctx: &Context<'_>) -> Result<Vec<Post>> {
        let store = ctx.data_unchecked::<StoreRef>();
        let filter = PostFilter {
            author_id: Some(self.id.clone()),
            visibility: PostVisibility::for_viewer(ctx.viewer_id()),
            ..Default::default()
        };
        let posts = store.list_posts(&filter, Page::all()).await.into_gql()?;
        Ok(posts.items.into_iter().map(Post::from).collect())
    }

    /// Comments written by this user on posts the caller may see
    async fn comments(&self, ctx: &Context<'_>) -> Result<Vec<Comment>> {
        let store = ctx.data_unchecked::<StoreRef>();
        let posts = &ctx.data_unchecked::<Services>().posts;
        let viewer = ctx.viewer_id();
        let comments = store
            .list_comments(&CommentFilter::by_user(&self.id), Page::all())
            .await
            .into_gql()?;

        let mut visible = Vec::with_capacity(comments.items.len());
        for comment in comments.items {
            let parent = posts.find_visible(&comment.post_id, viewer).await.into_gql()?;
            if parent.is_some() {
                visible.push(Comment::from(comment));
            }
        }
        Ok(visible)
    }
}

/// Input for registering a user
#[derive(Debug, InputObject)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
    /// At least 6 characters
    pub password: String,
}

impl From<CreateUserInput> for RegisterUser {
    fn from(input: CreateUserInput) -> Self {
        Self {
            name: input.name,
            email: input.email,
            password: input.password,
        }
    }
}

#[derive(Debug, InputObject)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Fields to change on the caller's account; absent fields are left alone
#[derive(Debug, InputObject)]
pub struct UpdateUserInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl From<UpdateUserInput> for EditUser {
    fn from(input: UpdateUserInput) -> Self {
        Self {
            name: input.name,
            email: input.email,
            password: input.password,
        }
    }
}

/// A user together with an access token
#[derive(Debug, SimpleObject)]
pub struct AuthPayload {
    pub user: User,
    /// Send as `Authorization: Bearer <token>`
    pub token: String,
}

impl From<Session> for AuthPayload {
    fn from(session: Session) -> Self {
        Self {
            user: session.user.into(),
            token: session.token,
        }
    }
}

// ============================================================================
// Posts
// ============================================================================

#[derive(Debug, Clone, SimpleObject)]
#[graphql(complex)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub content: String,
    pub published: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<PostRecord> for Post {
    fn from(r: PostRecord) -> Self {
        Self {
            id: r.id,
            author_id: r.author_id,
            title: r.title,
            content: r.content,
            published: r.published,
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.to_rfc3339(),
        }
    }
}

#[ComplexObject]
impl Post {
    async fn author(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let store = ctx.data_unchecked::<StoreRef>();
        let user = store.find_user(&self.author_id).await.into_gql()?;
        Ok(user.map(User::from))
    }

    /// Empty unless the post, as currently stored, is visible to the caller
    ///
    /// Subscription payloads can carry a snapshot older than the store, so
    /// the snapshot's own `published` flag is not trusted here.
    async fn comments(&self, ctx: &Context<'_>) -> Result<Vec<Comment>> {
        let services = ctx.data_unchecked::<Services>();
        let current = services
            .posts
            .find_visible(&self.id, ctx.viewer_id())
            .await
            .into_gql()?;
        if current.is_none() {
            return Ok(Vec::new());
        }
        let store = ctx.data_unchecked::<StoreRef>();
        let comments = store
            .list_comments(&CommentFilter::for_post(&self.id), Page::all())
            .await
            .into_gql()?;
        Ok(comments.items.into_iter().map(Comment::from).collect())
    }
}

#[derive(Debug, InputObject)]
pub struct CreatePostInput {
    pub title: String,
    #[graphql(default)]
    pub content: String,
    /// Drafts are only visible to their author
    #[graphql(default)]
    pub published: bool,
}

impl From<CreatePostInput> for NewPost {
    fn from(input: CreatePostInput) -> Self {
        Self {
            title: input.title,
            content: input.content,
            published: input.published,
        }
    }
}

#[derive(Debug, InputObject)]
pub struct UpdatePostInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub published: Option<bool>,
}

impl From<UpdatePostInput> for UpdatePost {
    fn from(input: UpdatePostInput) -> Self {
        Self {
            title: input.title,
            content: input.content,
            published: input.published,
        }
    }
}

// ============================================================================
// Comments
// ============================================================================

#[derive(Debug, Clone, SimpleObject)]
#[graphql(complex)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<CommentRecord> for Comment {
    fn from(r: CommentRecord) -> Self {
        Self {
            id: r.id,
            post_id: r.post_id,
            user_id: r.user_id,
            content: r.content,
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.to_rfc3339(),
        }
    }
}

#[ComplexObject]
impl Comment {
    async fn author(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let store = ctx.data_unchecked::<StoreRef>();
        let user = store.find_user(&self.user_id).await.into_gql()?;
        Ok(user.map(User::from))
    }

    async fn post(&self, ctx: &Context<'_>) -> Result<Option<Post>> {
        let services = ctx.data_unchecked::<Services>();
        let post = services
            .posts
            .find_visible(&self.post_id, ctx.viewer_id())
            .await
            .into_gql()?;
        Ok(post.map(Post::from))
    }
}

#[derive(Debug, InputObject)]
pub struct CreateCommentInput {
    pub post_id: String,
    pub content: String,
}

#[derive(Debug, InputObject)]
pub struct UpdateCommentInput {
    pub content: Option<String>,
}

// ============================================================================
// Connections
// ============================================================================

define_connection!(UserConnection, UserEdge, User);
define_connection!(PostConnection, PostEdge, Post);
define_connection!(CommentConnection, CommentEdge, Comment);

// ============================================================================
// Subscription payloads
// ============================================================================

/// Kind of change carried by a subscription event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
pub enum MutationType {
    Created,
    Updated,
    Deleted,
}

impl From<MutationKind> for MutationType {
    fn from(kind: MutationKind) -> Self {
        match kind {
            MutationKind::Created => Self::Created,
            MutationKind::Updated => Self::Updated,
            MutationKind::Deleted => Self::Deleted,
        }
    }
}

#[derive(Debug, Clone, SimpleObject)]
pub struct PostSubscriptionPayload {
    pub mutation: MutationType,
    /// For DELETED, the post as it was before the change
    pub data: Post,
}

impl From<PostEvent> for PostSubscriptionPayload {
    fn from(event: PostEvent) -> Self {
        let (kind, post) = event.into_parts();
        Self {
            mutation: kind.into(),
            data: post.into(),
        }
    }
}

#[derive(Debug, Clone, SimpleObject)]
pub struct CommentSubscriptionPayload {
    pub mutation: MutationType,
    pub data: Comment,
}

impl From<CommentEvent> for CommentSubscriptionPayload {
    fn from(event: CommentEvent) -> Self {
        let (kind, comment) = event.into_parts();
        Self {
            mutation: kind.into(),
            data: comment.into(),
        }
    }
}
