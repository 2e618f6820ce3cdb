//! GraphQL authentication and authorization
//!
//! The transport resolves the bearer token once per request (or once per
//! WebSocket connection) and attaches an [`AuthUser`] to the request data.
//! Resolvers read it through [`AuthExt`].
//!
//! Use `AuthGuard` to require authentication on any GraphQL operation:
//!
//! ```ignore
//! #[graphql(guard = "AuthGuard")]
//! async fn my_posts(&self, ctx: &Context<'_>) -> Result<PostConnection> { ... }
//! ```

use async_graphql::{Context, ErrorExtensions, Result};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::services::AuthService;

/// The authenticated principal, available in GraphQL resolvers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: String,
}

/// Resolve a raw bearer token into a principal
///
/// An invalid or expired token makes the caller anonymous rather than failing
/// the request; anything needing a principal then reports `UNAUTHORIZED`.
pub fn authenticate(auth: &AuthService, token: &str) -> Option<AuthUser> {
    match auth.verify_token(token) {
        Ok(claims) => Some(AuthUser {
            user_id: claims.sub,
        }),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring invalid bearer token");
            None
        }
    }
}

/// Extension trait to get authenticated user from GraphQL context
pub trait AuthExt {
    /// Get the authenticated user, or return an error if not authenticated
    fn auth_user(&self) -> Result<&AuthUser>;

    /// Get the authenticated user if present
    fn try_auth_user(&self) -> Option<&AuthUser>;

    /// The caller's user id, if authenticated
    fn viewer_id(&self) -> Option<&str> {
        self.try_auth_user().map(|u| u.user_id.as_str())
    }
}

impl<'a> AuthExt for Context<'a> {
    fn auth_user(&self) -> Result<&AuthUser> {
        self.data_opt::<AuthUser>()
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".into()).extend())
    }

    fn try_auth_user(&self) -> Option<&AuthUser> {
        self.data_opt::<AuthUser>()
    }
}

/// Guard that requires authentication for GraphQL operations.
pub struct AuthGuard;

impl async_graphql::Guard for AuthGuard {
    fn check(&self, ctx: &Context<'_>) -> impl std::future::Future<Output = Result<()>> + Send {
        let result = ctx.auth_user().map(|_| ());
        async move { result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::AuthConfig;

    #[test]
    fn test_authenticate() {
        let auth = AuthService::new(AuthConfig {
            jwt_secret: "test-secret".into(),
            access_token_lifetime: 60,
            bcrypt_cost: 4,
        });
        let token = auth.issue_token("U1").unwrap();

        assert_eq!(
            authenticate(&auth, &token),
            Some(AuthUser {
                user_id: "U1".into()
            })
        );
        assert_eq!(authenticate(&auth, "garbage"), None);
    }
}
