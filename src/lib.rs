//! GraphQL blog API with live post and comment subscriptions
//!
//! Mutations on users, posts and comments are persisted through [`db::Store`]
//! and then announced on an in-process pub/sub bus ([`pubsub::PubSub`]), which
//! the GraphQL subscription resolvers expose to WebSocket clients.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod graphql;
pub mod pubsub;
pub mod services;

use std::sync::Arc;

use anyhow::Result;

use crate::db::StoreRef;
use crate::graphql::BlogSchema;
use crate::pubsub::PubSub;
use crate::services::{AuthConfig, AuthService, Services};

/// Everything a transport needs, wired to one store and one bus
#[derive(Clone)]
pub struct App {
    pub schema: BlogSchema,
    pub store: StoreRef,
    pub bus: Arc<PubSub>,
    pub services: Services,
}

impl App {
    pub fn new(store: StoreRef, auth: AuthConfig, pubsub_capacity: usize) -> Self {
        let bus = Arc::new(PubSub::new(pubsub_capacity));
        let services = Services::new(store.clone(), bus.clone(), AuthService::new(auth));
        let schema = graphql::build_schema(store.clone(), bus.clone(), services.clone());
        Self {
            schema,
            store,
            bus,
            services,
        }
    }

    /// Seed demo data when the store is empty; every demo user gets `password`
    pub async fn seed_demo_data(&self, password: &str) -> Result<bool> {
        let hash = self.services.auth.hash_password(password)?;
        db::seed::run_seeds(self.store.as_ref(), &hash).await
    }

    pub fn router(&self) -> axum::Router {
        api::router(api::AppState {
            schema: self.schema.clone(),
            store: self.store.clone(),
            auth: self.services.auth.clone(),
        })
    }
}
