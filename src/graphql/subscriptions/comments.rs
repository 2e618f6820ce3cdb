use std::sync::Arc;

use async_graphql::{Context, ErrorExtensions, Result, Subscription};
use futures::{Stream, StreamExt};

use crate::error::{ApiError, GraphqlResultExt};
use crate::graphql::auth::AuthExt;
use crate::graphql::types::CommentSubscriptionPayload;
use crate::pubsub::{CommentTopic, PubSub};
use crate::services::Services;

#[derive(Default)]
pub struct CommentSubscriptions;

#[Subscription]
impl CommentSubscriptions {
    /// Comment activity under one post
    ///
    /// Fails straight away if the post does not exist or is a draft the
    /// caller did not write.
    async fn comment(
        &self,
        ctx: &Context<'_>,
        post_id: String,
    ) -> Result<impl Stream<Item = CommentSubscriptionPayload>> {
        let services = ctx.data_unchecked::<Services>();
        let visible = services
            .posts
            .find_visible(&post_id, ctx.viewer_id())
            .await
            .into_gql()?;
        if visible.is_none() {
            return Err(ApiError::not_found("post", &post_id).extend());
        }

        let bus = ctx.data_unchecked::<Arc<PubSub>>();
        Ok(bus
            .subscribe::<CommentTopic>(Some(&post_id))
            .map(CommentSubscriptionPayload::from))
    }
}
