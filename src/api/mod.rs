//! HTTP surface: GraphQL over POST and WebSocket, GraphiQL, health probes

pub mod graphql;
pub mod health;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::db::StoreRef;
use crate::graphql::BlogSchema;
use crate::services::AuthService;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub schema: BlogSchema,
    pub store: StoreRef,
    pub auth: AuthService,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // Health endpoints (no auth required)
        .merge(health::router())
        .route("/graphql", get(graphql::graphiql).post(graphql::graphql_handler))
        .route("/graphql/ws", get(graphql::graphql_ws_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
