use super::prelude::*;

#[derive(Default)]
pub struct CommentQueries;

#[Object]
impl CommentQueries {
    /// A comment by ID; null when its post is not visible to the caller
    async fn comment(&self, ctx: &Context<'_>, id: String) -> Result<Option<Comment>> {
        let store = ctx.data_unchecked::<StoreRef>();
        let services = ctx.data_unchecked::<Services>();
        let Some(comment) = store.find_comment(&id).await.into_gql()? else {
            return Ok(None);
        };
        let parent = services
            .posts
            .find_visible(&comment.post_id, ctx.viewer_id())
            .await
            .into_gql()?;
        if parent.is_none() {
            return Ok(None);
        }
        Ok(Some(comment.into()))
    }

    /// Comments on a post, oldest first
    async fn comments(
        &self,
        ctx: &Context<'_>,
        post_id: String,
        first: Option<i32>,
        after: Option<String>,
    ) -> Result<CommentConnection> {
        let store = ctx.data_unchecked::<StoreRef>();
        let services = ctx.data_unchecked::<Services>();
        let page = page_args(first, after).into_gql()?;

        let parent = services
            .posts
            .find_visible(&post_id, ctx.viewer_id())
            .await
            .into_gql()?;
        if parent.is_none() {
            return Ok(Connection::<Comment>::empty().into());
        }

        let comments = store
            .list_comments(&CommentFilter::for_post(post_id), page)
            .await
            .into_gql()?;
        Ok(Connection::<Comment>::from_paged(comments, page).into())
    }
}
