use super::prelude::*;

#[derive(Default)]
pub struct PostQueries;

#[Object]
impl PostQueries {
    /// A post by ID; null when missing or not visible to the caller
    async fn post(&self, ctx: &Context<'_>, id: String) -> Result<Option<Post>> {
        let services = ctx.data_unchecked::<Services>();
        let post = services
            .posts
            .find_visible(&id, ctx.viewer_id())
            .await
            .into_gql()?;
        Ok(post.map(Post::from))
    }

    /// Posts visible to the caller, oldest first
    ///
    /// `query` matches against title or content, case-insensitively.
    async fn posts(
        &self,
        ctx: &Context<'_>,
        query: Option<String>,
        first: Option<i32>,
        after: Option<String>,
    ) -> Result<PostConnection> {
        let store = ctx.data_unchecked::<StoreRef>();
        let page = page_args(first, after).into_gql()?;
        let filter = PostFilter {
            visibility: PostVisibility::for_viewer(ctx.viewer_id()),
            search: query.filter(|q| !q.trim().is_empty()),
            ..Default::default()
        };
        let posts = store.list_posts(&filter, page).await.into_gql()?;
        Ok(Connection::<Post>::from_paged(posts, page).into())
    }

    /// The caller's own posts, drafts included
    #[graphql(guard = "AuthGuard")]
    async fn my_posts(
        &self,
        ctx: &Context<'_>,
        first: Option<i32>,
        after: Option<String>,
    ) -> Result<PostConnection> {
        let user = ctx.auth_user()?;
        let store = ctx.data_unchecked::<StoreRef>();
        let page = page_args(first, after).into_gql()?;
        let filter = PostFilter {
            author_id: Some(user.user_id.clone()),
            ..Default::default()
        };
        let posts = store.list_posts(&filter, page).await.into_gql()?;
        Ok(Connection::<Post>::from_paged(posts, page).into())
    }
}
