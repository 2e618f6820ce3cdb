//! Business logic shared by the GraphQL resolvers
//!
//! Services own the write paths: they validate input, gate on ownership,
//! call the store and then announce the change on the pub/sub bus.

pub mod auth;
pub mod comments;
pub mod logging;
pub mod posts;
pub mod users;
pub mod validation;

use std::sync::Arc;

pub use auth::{AccessTokenClaims, AuthConfig, AuthService};
pub use comments::CommentService;
pub use logging::{LogFormat, init_tracing};
pub use posts::{NewPost, PostService, classify_update};
pub use users::{EditUser, RegisterUser, Session, UserService};

use crate::db::StoreRef;
use crate::pubsub::PubSub;

/// Every service, wired to the same store and bus
#[derive(Clone)]
pub struct Services {
    pub auth: AuthService,
    pub users: UserService,
    pub posts: PostService,
    pub comments: CommentService,
}

impl Services {
    pub fn new(store: StoreRef, bus: Arc<PubSub>, auth: AuthService) -> Self {
        Self {
            users: UserService::new(store.clone(), bus.clone(), auth.clone()),
            posts: PostService::new(store.clone(), bus.clone()),
            comments: CommentService::new(store, bus),
            auth,
        }
    }
}
