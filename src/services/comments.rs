//! Comment mutations
//!
//! Comment events always go to `postId:comment`, keyed by the parent post.

use std::sync::Arc;

use tracing::info;

use crate::db::{CommentRecord, CreateComment, StoreRef, UpdateComment};
use crate::error::{ApiError, ApiResult};
use crate::pubsub::{CommentTopic, MutationEvent, PubSub};

use super::validation;

#[derive(Clone)]
pub struct CommentService {
    store: StoreRef,
    bus: Arc<PubSub>,
}

impl CommentService {
    pub fn new(store: StoreRef, bus: Arc<PubSub>) -> Self {
        Self { store, bus }
    }

    /// Comment on a post the actor can see
    pub async fn create(&self, actor: &str, post_id: &str, content: String) -> ApiResult<CommentRecord> {
        validation::non_empty("content", &content)?;
        self.store
            .find_post(post_id)
            .await?
            .filter(|p| p.is_visible_to(Some(actor)))
            .ok_or_else(|| ApiError::not_found("post", post_id))?;
        if self.store.find_user(actor).await?.is_none() {
            return Err(ApiError::not_found("user", actor));
        }

        let comment = self
            .store
            .create_comment(CreateComment {
                post_id: post_id.to_string(),
                user_id: actor.to_string(),
                content,
            })
            .await?;

        info!(comment_id = %comment.id, post_id = %comment.post_id, "Comment created");
        self.bus
            .publish::<CommentTopic>(Some(&comment.post_id), MutationEvent::Created(comment.clone()));
        Ok(comment)
    }

    pub async fn update(&self, actor: &str, id: &str, content: Option<String>) -> ApiResult<CommentRecord> {
        let existing = self
            .store
            .find_comment(id)
            .await?
            .ok_or_else(|| ApiError::not_found("comment", id))?;
        validation::owner(actor, &existing.user_id, "comment")?;
        if let Some(content) = &content {
            validation::non_empty("content", content)?;
        }

        let revision = self
            .store
            .update_comment(id, UpdateComment { content })
            .await?
            .ok_or_else(|| ApiError::not_found("comment", id))?;

        let comment = revision.after;
        self.bus
            .publish::<CommentTopic>(Some(&comment.post_id), MutationEvent::Updated(comment.clone()));
        Ok(comment)
    }

    pub async fn delete(&self, actor: &str, id: &str) -> ApiResult<CommentRecord> {
        let existing = self
            .store
            .find_comment(id)
            .await?
            .ok_or_else(|| ApiError::not_found("comment", id))?;
        validation::owner(actor, &existing.user_id, "comment")?;

        let comment = self
            .store
            .delete_comment(id)
            .await?
            .ok_or_else(|| ApiError::not_found("comment", id))?;

        info!(comment_id = %comment.id, post_id = %comment.post_id, "Comment deleted");
        self.bus
            .publish::<CommentTopic>(Some(&comment.post_id), MutationEvent::Deleted(comment.clone()));
        Ok(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pubsub::MutationKind;
    use crate::services::posts::NewPost;
    use crate::services::testing;
    use assert_matches::assert_matches;
    use futures::{FutureExt, StreamExt};

    async fn post(services: &crate::services::Services, author: &str, published: bool) -> String {
        services
            .posts
            .create(
                author,
                NewPost {
                    title: "graphql".into(),
                    content: "graphql is awesome".into(),
                    published,
                },
            )
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_events_keyed_by_parent_post() {
        let (services, _store, bus) = testing::services();
        let author = testing::user(&services, "khalil").await;
        let p1 = post(&services, &author.id, true).await;
        let p2 = post(&services, &author.id, true).await;

        let mut on_p1 = bus.subscribe::<CommentTopic>(Some(&p1));
        let mut on_p2 = bus.subscribe::<CommentTopic>(Some(&p2));

        let comment = services
            .comments
            .create(&author.id, &p1, "like graphql".into())
            .await
            .unwrap();
        services
            .comments
            .update(&author.id, &comment.id, Some("love graphql".into()))
            .await
            .unwrap();
        services.comments.delete(&author.id, &comment.id).await.unwrap();

        let kinds: Vec<MutationKind> = on_p1.by_ref().take(3).map(|e| e.kind()).collect().await;
        assert_eq!(
            kinds,
            vec![MutationKind::Created, MutationKind::Updated, MutationKind::Deleted]
        );
        assert!(on_p2.next().now_or_never().is_none());
    }

    #[tokio::test]
    async fn test_cannot_comment_on_hidden_draft() {
        let (services, _store, _bus) = testing::services();
        let author = testing::user(&services, "khalil").await;
        let reader = testing::user(&services, "wissem").await;
        let draft = post(&services, &author.id, false).await;

        assert_matches!(
            services.comments.create(&reader.id, &draft, "first".into()).await,
            Err(ApiError::NotFound(_))
        );
        assert!(services.comments.create(&author.id, &draft, "note".into()).await.is_ok());
    }

    #[tokio::test]
    async fn test_only_author_edits_comment() {
        let (services, store, _bus) = testing::services();
        let author = testing::user(&services, "khalil").await;
        let other = testing::user(&services, "wissem").await;
        let p1 = post(&services, &author.id, true).await;
        let comment = services
            .comments
            .create(&author.id, &p1, "like graphql".into())
            .await
            .unwrap();

        assert_matches!(
            services.comments.update(&other.id, &comment.id, Some("x".into())).await,
            Err(ApiError::Forbidden(_))
        );
        assert_matches!(
            services.comments.delete(&other.id, &comment.id).await,
            Err(ApiError::Forbidden(_))
        );
        assert!(store.find_comment(&comment.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_empty_content_rejected() {
        let (services, _store, _bus) = testing::services();
        let author = testing::user(&services, "khalil").await;
        let p1 = post(&services, &author.id, true).await;
        assert_matches!(
            services.comments.create(&author.id, &p1, "".into()).await,
            Err(ApiError::Validation(_))
        );
    }
}
