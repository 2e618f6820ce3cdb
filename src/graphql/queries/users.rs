use super::prelude::*;

#[derive(Default)]
pub struct UserQueries;

#[Object]
impl UserQueries {
    /// The authenticated user
    #[graphql(guard = "AuthGuard")]
    async fn me(&self, ctx: &Context<'_>) -> Result<User> {
        let user = ctx.auth_user()?;
        let store = ctx.data_unchecked::<StoreRef>();
        store
            .find_user(&user.user_id)
            .await
            .into_gql()?
            .map(User::from)
            .ok_or_else(|| ApiError::not_found("user", &user.user_id))
            .into_gql()
    }

    async fn user(&self, ctx: &Context<'_>, id: String) -> Result<Option<User>> {
        let store = ctx.data_unchecked::<StoreRef>();
        let user = store.find_user(&id).await.into_gql()?;
        Ok(user.map(User::from))
    }

    async fn users(
        &self,
        ctx: &Context<'_>,
        first: Option<i32>,
        after: Option<String>,
    ) -> Result<UserConnection> {
        let store = ctx.data_unchecked::<StoreRef>();
        let page = page_args(first, after).into_gql()?;
        let users = store.list_users(page).await.into_gql()?;
        Ok(Connection::<User>::from_paged(users, page).into())
    }
}
