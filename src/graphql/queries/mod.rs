pub mod comments;
pub mod posts;
pub mod users;

pub use comments::CommentQueries;
pub use posts::PostQueries;
pub use users::UserQueries;

pub(crate) mod prelude {
    pub(crate) use async_graphql::{Context, Object, Result};

    pub(crate) use crate::db::{CommentFilter, PostFilter, PostVisibility, StoreRef};
    pub(crate) use crate::error::{ApiError, GraphqlResultExt};
    pub(crate) use crate::graphql::auth::{AuthExt, AuthGuard};
    pub(crate) use crate::graphql::pagination::{Connection, page_args};
    pub(crate) use crate::graphql::types::*;
    pub(crate) use crate::services::Services;
}
