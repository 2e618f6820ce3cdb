//! GraphQL API with subscriptions for real-time updates
//!
//! Queries, mutations and subscriptions are split per entity under
//! `queries/`, `mutations/` and `subscriptions/`, then merged into the roots
//! in `schema.rs`. Schema data carries the store, the pub/sub bus and the
//! services; the authenticated [`AuthUser`] is attached per request.

pub mod auth;
pub mod mutations;
pub mod pagination;
pub mod queries;
mod schema;
pub mod subscriptions;
pub mod types;

pub use auth::{AuthUser, authenticate};
pub use schema::{BlogSchema, MutationRoot, QueryRoot, build_schema};
