use std::sync::Arc;

use async_graphql::{Context, Result, Subscription};
use futures::{Stream, StreamExt};

use crate::graphql::auth::{AuthExt, AuthGuard};
use crate::graphql::types::PostSubscriptionPayload;
use crate::pubsub::{AuthorPostTopic, PostTopic, PubSub};

#[derive(Default)]
pub struct PostSubscriptions;

#[Subscription]
impl PostSubscriptions {
    /// Changes to published posts
    ///
    /// Publishing a draft arrives as CREATED and unpublishing as DELETED.
    async fn post(&self, ctx: &Context<'_>) -> impl Stream<Item = PostSubscriptionPayload> {
        let bus = ctx.data_unchecked::<Arc<PubSub>>();
        bus.subscribe::<PostTopic>(None)
            .map(PostSubscriptionPayload::from)
    }

    /// Every change to the caller's own posts, drafts included
    #[graphql(guard = "AuthGuard")]
    async fn my_post(
        &self,
        ctx: &Context<'_>,
    ) -> Result<impl Stream<Item = PostSubscriptionPayload>> {
        let user = ctx.auth_user()?;
        let bus = ctx.data_unchecked::<Arc<PubSub>>();
        Ok(bus
            .subscribe::<AuthorPostTopic>(Some(&user.user_id))
            .map(PostSubscriptionPayload::from))
    }
}
