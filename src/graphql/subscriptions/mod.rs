//! GraphQL subscriptions for real-time updates
//!
//! Each resolver attaches to one topic instance on the pub/sub bus. The
//! returned stream ends (and the registration is released) when the client
//! unsubscribes or disconnects.

pub mod comments;
pub mod posts;

use async_graphql::MergedSubscription;

pub use comments::CommentSubscriptions;
pub use posts::PostSubscriptions;

#[derive(MergedSubscription, Default)]
pub struct SubscriptionRoot(PostSubscriptions, CommentSubscriptions);
