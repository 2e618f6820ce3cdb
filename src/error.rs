//! API error taxonomy
//!
//! Every failure surfaced to a GraphQL caller goes through [`ApiError`], which
//! maps onto an `extensions.code` the client can branch on.

use async_graphql::ErrorExtensions;

/// Request-level failure returned by services and resolvers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The referenced entity does not exist (or is not visible to the caller)
    #[error("{0}")]
    NotFound(String),

    /// A unique field is already taken
    #[error("{0}")]
    Conflict(String),

    /// Missing or invalid credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed to touch this entity
    #[error("{0}")]
    Forbidden(String),

    /// Malformed input
    #[error("{0}")]
    Validation(String),

    /// Store or infrastructure failure
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        Self::NotFound(format!("{} {} not found", entity, id))
    }

    /// Machine-readable code placed in the GraphQL error extensions
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> async_graphql::Error {
        let message = match self {
            ApiError::Internal(e) => {
                tracing::error!(error = ?e, "Internal error while handling request");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let code = self.code();
        async_graphql::Error::new(message).extend_with(|_, e| e.set("code", code))
    }
}

/// Converts service results into GraphQL results, keeping the error code
pub trait GraphqlResultExt<T> {
    fn into_gql(self) -> async_graphql::Result<T>;
}

impl<T> GraphqlResultExt<T> for ApiResult<T> {
    fn into_gql(self) -> async_graphql::Result<T> {
        self.map_err(|e| e.extend())
    }
}

impl<T> GraphqlResultExt<T> for anyhow::Result<T> {
    fn into_gql(self) -> async_graphql::Result<T> {
        self.map_err(|e| ApiError::Internal(e).extend())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(ApiError::not_found("post", "1").code(), "NOT_FOUND");
        assert_eq!(ApiError::Forbidden("no".into()).code(), "FORBIDDEN");
        assert_eq!(ApiError::Validation("bad".into()).code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(ApiError::not_found("post", "p1").to_string(), "post p1 not found");
    }

    #[test]
    fn test_internal_error_is_masked() {
        let err = ApiError::Internal(anyhow::anyhow!("disk on fire")).extend();
        assert_eq!(err.message, "Internal server error");
        assert!(err.extensions.is_some());
    }
}
