pub mod comments;
pub mod posts;
pub mod users;

pub use comments::CommentMutations;
pub use posts::PostMutations;
pub use users::UserMutations;

pub(crate) mod prelude {
    pub(crate) use async_graphql::{Context, Object, Result};

    pub(crate) use crate::error::GraphqlResultExt;
    pub(crate) use crate::graphql::auth::{AuthExt, AuthGuard};
    pub(crate) use crate::graphql::types::*;
    pub(crate) use crate::services::Services;
}
