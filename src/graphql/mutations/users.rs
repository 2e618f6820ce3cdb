use super::prelude::*;

#[derive(Default)]
pub struct UserMutations;

#[Object]
impl UserMutations {
    /// Register a new account and return a session token
    async fn create_user(&self, ctx: &Context<'_>, input: CreateUserInput) -> Result<AuthPayload> {
        let services = ctx.data_unchecked::<Services>();
        let session = services.users.register(input.into()).await.into_gql()?;
        Ok(session.into())
    }

    /// Exchange credentials for a session token; refused when already logged in
    async fn login(&self, ctx: &Context<'_>, input: LoginInput) -> Result<AuthPayload> {
        let services = ctx.data_unchecked::<Services>();
        let session = services
            .users
            .login(ctx.viewer_id(), &input.email, &input.password)
            .await
            .into_gql()?;
        Ok(session.into())
    }

    /// Edit the caller's own account
    #[graphql(guard = "AuthGuard")]
    async fn update_user(&self, ctx: &Context<'_>, input: UpdateUserInput) -> Result<User> {
        let user = ctx.auth_user()?;
        let services = ctx.data_unchecked::<Services>();
        let updated = services
            .users
            .update(&user.user_id, input.into())
            .await
            .into_gql()?;
        Ok(updated.into())
    }

    /// Delete the caller's account with all of its posts and comments
    #[graphql(guard = "AuthGuard")]
    async fn delete_user(&self, ctx: &Context<'_>) -> Result<User> {
        let user = ctx.auth_user()?;
        let services = ctx.data_unchecked::<Services>();
        let deleted = services.users.delete(&user.user_id).await.into_gql()?;
        Ok(deleted.into())
    }
}
