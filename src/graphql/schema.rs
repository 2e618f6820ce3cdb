//! GraphQL schema definition with queries, mutations, and subscriptions

use std::sync::Arc;

use async_graphql::extensions::Tracing;
use async_graphql::{MergedObject, Schema};

use crate::db::StoreRef;
use crate::pubsub::PubSub;
use crate::services::Services;

use super::mutations::{CommentMutations, PostMutations, UserMutations};
use super::queries::{CommentQueries, PostQueries, UserQueries};
use super::subscriptions::SubscriptionRoot;

/// The GraphQL schema type
pub type BlogSchema = Schema<QueryRoot, MutationRoot, SubscriptionRoot>;

#[derive(MergedObject, Default)]
pub struct QueryRoot(UserQueries, PostQueries, CommentQueries);

#[derive(MergedObject, Default)]
pub struct MutationRoot(UserMutations, PostMutations, CommentMutations);

/// Nested resolvers form cycles (post -> author -> posts -> ...)
const MAX_QUERY_DEPTH: usize = 16;

/// Build the GraphQL schema with all resolvers
pub fn build_schema(store: StoreRef, bus: Arc<PubSub>, services: Services) -> BlogSchema {
    Schema::build(
        QueryRoot::default(),
        MutationRoot::default(),
        SubscriptionRoot::default(),
    )
    .limit_depth(MAX_QUERY_DEPTH)
    .extension(Tracing)
    .data(store)
    .data(bus)
    .data(services)
    .finish()
}
