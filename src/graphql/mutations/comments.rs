use super::prelude::*;

#[derive(Default)]
pub struct CommentMutations;

#[Object]
impl CommentMutations {
    #[graphql(guard = "AuthGuard")]
    async fn create_comment(&self, ctx: &Context<'_>, input: CreateCommentInput) -> Result<Comment> {
        let user = ctx.auth_user()?;
        let services = ctx.data_unchecked::<Services>();
        let comment = services
            .comments
            .create(&user.user_id, &input.post_id, input.content)
            .await
            .into_gql()?;
        Ok(comment.into())
    }

    #[graphql(guard = "AuthGuard")]
    async fn update_comment(
        &self,
        ctx: &Context<'_>,
        id: String,
        input: UpdateCommentInput,
    ) -> Result<Comment> {
        let user = ctx.auth_user()?;
        let services = ctx.data_unchecked::<Services>();
        let comment = services
            .comments
            .update(&user.user_id, &id, input.content)
            .await
            .into_gql()?;
        Ok(comment.into())
    }

    #[graphql(guard = "AuthGuard")]
    async fn delete_comment(&self, ctx: &Context<'_>, id: String) -> Result<Comment> {
        let user = ctx.auth_user()?;
        let services = ctx.data_unchecked::<Services>();
        let comment = services.comments.delete(&user.user_id, &id).await.into_gql()?;
        Ok(comment.into())
    }
}
