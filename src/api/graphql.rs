//! GraphQL transport handlers

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLProtocol, GraphQLRequest, GraphQLResponse, GraphQLWebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::header::{ACCEPT, AUTHORIZATION};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse};

use crate::graphql::{AuthUser, authenticate};
use crate::services::AuthService;

use super::AppState;

/// Extract bearer token from Authorization header
fn extract_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Token from a `connection_init` payload; accepts a bare token or `Bearer <token>`
fn token_from_init_payload(params: &serde_json::Value) -> Option<&str> {
    params
        .get("Authorization")
        .or_else(|| params.get("authorization"))
        .or_else(|| params.get("token"))
        .and_then(|v| v.as_str())
        .map(|t| t.strip_prefix("Bearer ").unwrap_or(t).trim())
        .filter(|t| !t.is_empty())
}

fn auth_data(auth: &AuthService, token: Option<&str>) -> async_graphql::Data {
    let mut data = async_graphql::Data::default();
    if let Some(user) = token.and_then(|t| authenticate(auth, t)) {
        data.insert::<AuthUser>(user);
    }
    data
}

/// GraphQL query/mutation handler with auth context
pub async fn graphql_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let mut request = req.into_inner();

    if let Some(user) = extract_token(&headers).and_then(|t| authenticate(&state.auth, t)) {
        request = request.data(user);
    }

    state.schema.execute(request).await.into()
}

/// GraphiQL interactive playground (only for browsers)
pub async fn graphiql(headers: HeaderMap) -> impl IntoResponse {
    let accepts_html = headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("text/html"));

    if accepts_html {
        Html(
            GraphiQLSource::build()
                .endpoint("/graphql")
                .subscription_endpoint("/graphql/ws")
                .finish(),
        )
        .into_response()
    } else {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            axum::Json(serde_json::json!({
                "error": "GET requests are not supported for GraphQL queries. Use POST with Content-Type: application/json"
            })),
        )
            .into_response()
    }
}

/// GraphQL WebSocket handler for subscriptions with auth
///
/// The principal comes from the upgrade request's `Authorization` header or,
/// for browser clients that cannot set headers, from the `connection_init`
/// payload.
pub async fn graphql_ws_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    protocol: GraphQLProtocol,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let header_data = auth_data(&state.auth, extract_token(&headers));
    let auth = state.auth.clone();

    ws.protocols(["graphql-transport-ws", "graphql-ws"])
        .on_upgrade(move |socket| {
            GraphQLWebSocket::new(socket, state.schema.clone(), protocol)
                .with_data(header_data)
                .on_connection_init(move |params| async move {
                    Ok(auth_data(&auth, token_from_init_payload(&params)))
                })
                .serve()
        })
}
