//! Post mutations and the events they produce
//!
//! Every write goes to the store first; events are published only once the
//! store reports success, so a failed write never reaches a subscriber.
//!
//! Two streams receive post events:
//! - `post` carries only what is publicly visible. An update is classified by
//!   how `published` changed (see [`classify_update`]).
//! - `userId:post` carries every event for the author's own posts, whatever
//!   their visibility.

use std::sync::Arc;

use tracing::{debug, info};

use crate::db::{CreatePost, PostRecord, StoreRef, UpdatePost};
use crate::error::{ApiError, ApiResult};
use crate::pubsub::{AuthorPostTopic, MutationEvent, PostEvent, PostTopic, PubSub};

use super::validation;

/// Fields a caller supplies when writing a post
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub published: bool,
}

/// What the public `post` stream should see for an update
///
/// | before | after | event            |
/// |--------|-------|------------------|
/// | true   | false | DELETED(before)  |
/// | false  | true  | CREATED(after)   |
/// | true   | true  | UPDATED(after)   |
/// | false  | false | none             |
pub fn classify_update(before: &PostRecord, after: &PostRecord) -> Option<PostEvent> {
    match (before.published, after.published) {
        (true, false) => Some(MutationEvent::Deleted(before.clone())),
        (false, true) => Some(MutationEvent::Created(after.clone())),
        (true, true) => Some(MutationEvent::Updated(after.clone())),
        (false, false) => None,
    }
}

pub(crate) fn announce_created(bus: &PubSub, post: &PostRecord) {
    if post.published {
        bus.publish::<PostTopic>(None, MutationEvent::Created(post.clone()));
    }
    bus.publish::<AuthorPostTopic>(Some(&post.author_id), MutationEvent::Created(post.clone()));
}

pub(crate) fn announce_updated(bus: &PubSub, before: &PostRecord, after: &PostRecord) {
    if let Some(event) = classify_update(before, after) {
        bus.publish::<PostTopic>(None, event);
    }
    bus.publish::<AuthorPostTopic>(Some(&after.author_id), MutationEvent::Updated(after.clone()));
}

pub(crate) fn announce_deleted(bus: &PubSub, post: &PostRecord) {
    if post.published {
        bus.publish::<PostTopic>(None, MutationEvent::Deleted(post.clone()));
    }
    bus.publish::<AuthorPostTopic>(Some(&post.author_id), MutationEvent::Deleted(post.clone()));
}

#[derive(Clone)]
pub struct PostService {
    store: StoreRef,
    bus: Arc<PubSub>,
}

impl PostService {
    pub fn new(store: StoreRef, bus: Arc<PubSub>) -> Self {
        Self { store, bus }
    }

    /// Fetch a post the viewer is allowed to read
    pub async fn find_visible(&self, id: &str, viewer: Option<&str>) -> ApiResult<Option<PostRecord>> {
        let post = self.store.find_post(id).await?;
        Ok(post.filter(|p| p.is_visible_to(viewer)))
    }

    pub async fn create(&self, actor: &str, input: NewPost) -> ApiResult<PostRecord> {
        validation::non_empty("title", &input.title)?;
        if self.store.find_user(actor).await?.is_none() {
            return Err(ApiError::not_found("user", actor));
        }

        let post = self
            .store
            .create_post(CreatePost {
                author_id: actor.to_string(),
                title: input.title,
                content: input.content,
                published: input.published,
            })
            .await?;

        info!(post_id = %post.id, author_id = %post.author_id, published = post.published, "Post created");
        announce_created(&self.bus, &post);
        Ok(post)
    }

    pub async fn update(&self, actor: &str, id: &str, update: UpdatePost) -> ApiResult<PostRecord> {
        let existing = self
            .store
            .find_post(id)
            .await?
            .ok_or_else(|| ApiError::not_found("post", id))?;
        validation::owner(actor, &existing.author_id, "post")?;
        if let Some(title) = &update.title {
            validation::non_empty("title", title)?;
        }

        let revision = self
            .store
            .update_post(id, update)
            .await?
            .ok_or_else(|| ApiError::not_found("post", id))?;

        debug!(
            post_id = %id,
            was_published = revision.before.published,
            published = revision.after.published,
            "Post updated"
        );
        announce_updated(&self.bus, &revision.before, &revision.after);
        Ok(revision.after)
    }

    /// Delete a post with its comments; returns the post as it was
    pub async fn delete(&self, actor: &str, id: &str) -> ApiResult<PostRecord> {
        let existing = self
            .store
            .find_post(id)
            .await?
            .ok_or_else(|| ApiError::not_found("post", id))?;
        validation::owner(actor, &existing.author_id, "post")?;

        let deletion = self
            .store
            .delete_post(id)
            .await?
            .ok_or_else(|| ApiError::not_found("post", id))?;

        info!(post_id = %id, comments_removed = deletion.comments_removed, "Post deleted");
        announce_deleted(&self.bus, &deletion.post);
        Ok(deletion.post)
    }
}
