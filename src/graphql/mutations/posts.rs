use super::prelude::*;

#[derive(Default)]
pub struct PostMutations;

#[Object]
impl PostMutations {
    #[graphql(guard = "AuthGuard")]
    async fn create_post(&self, ctx: &Context<'_>, input: CreatePostInput) -> Result<Post> {
        let user = ctx.auth_user()?;
        let services = ctx.data_unchecked::<Services>();
        let post = services
            .posts
            .create(&user.user_id, input.into())
            .await
            .into_gql()?;
        Ok(post.into())
    }

    /// Change any subset of fields; toggling `published` shows or hides the
    /// post for `post` subscribers
    #[graphql(guard = "AuthGuard")]
    async fn update_post(
        &self,
        ctx: &Context<'_>,
        id: String,
        input: UpdatePostInput,
    ) -> Result<Post> {
        let user = ctx.auth_user()?;
        let services = ctx.data_unchecked::<Services>();
        let post = services
            .posts
            .update(&user.user_id, &id, input.into())
            .await
            .into_gql()?;
        Ok(post.into())
    }

    /// Delete a post and its comments, returning the post as it was
    #[graphql(guard = "AuthGuard")]
    async fn delete_post(&self, ctx: &Context<'_>, id: String) -> Result<Post> {
        let user = ctx.auth_user()?;
        let services = ctx.data_unchecked::<Services>();
        let post = services.posts.delete(&user.user_id, &id).await.into_gql()?;
        Ok(post.into())
    }
}
