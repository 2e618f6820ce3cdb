//! Password hashing and JWT handling
//!
//! Provides:
//! - Password hashing with bcrypt
//! - HS256 access token generation and validation

use anyhow::{Result, anyhow};
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// JWT Claims
// ============================================================================

/// Claims carried in an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// User ID (subject)
    pub sub: String,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

// ============================================================================
// Configuration
// ============================================================================

/// Auth service configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// JWT signing secret
    pub jwt_secret: String,
    /// Access token lifetime in seconds (default: 7 days)
    pub access_token_lifetime: i64,
    /// Bcrypt cost factor
    pub bcrypt_cost: u32,
}

const DEFAULT_TOKEN_LIFETIME: i64 = 7 * 24 * 60 * 60;

impl AuthConfig {
    pub fn from_env() -> Self {
        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret.trim().to_string(),
            _ => {
                tracing::warn!(
                    "JWT_SECRET not set, using a random secret; tokens will not survive a restart"
                );
                generate_dev_secret()
            }
        };

        Self {
            jwt_secret,
            access_token_lifetime: std::env::var("ACCESS_TOKEN_LIFETIME")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TOKEN_LIFETIME),
            bcrypt_cost: std::env::var("BCRYPT_COST")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_COST),
        }
    }
}

fn generate_dev_secret() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

// ============================================================================
// Auth Service
// ============================================================================

/// Stateless credential service; cheap to clone
#[derive(Clone)]
pub struct AuthService {
    config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Hash a password with bcrypt
    pub fn hash_password(&self, password: &str) -> Result<String> {
        hash(password, self.config.bcrypt_cost)
            .map_err(|e| anyhow!("Failed to hash password: {}", e))
    }

    /// Verify a password against a hash
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        verify(password, hash).map_err(|e| anyhow!("Failed to verify password: {}", e))
    }

    /// Sign an access token for `user_id`
    pub fn issue_token(&self, user_id: &str) -> Result<String> {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            sub: user_id.to_string(),
            exp: (now + Duration::seconds(self.config.access_token_lifetime)).timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| anyhow!("Failed to create access token: {}", e))
    }

    /// Validate signature and expiry, returning the claims
    pub fn verify_token(&self, token: &str) -> Result<AccessTokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_aud = false;

        let data = decode::<AccessTokenClaims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| anyhow!("Invalid token: {}", e))?;

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(AuthConfig {
            jwt_secret: "test-secret".into(),
            access_token_lifetime: 60,
            bcrypt_cost: 4,
        })
    }

    #[test]
    fn test_password_roundtrip() {
        let auth = service();
        let hashed = auth.hash_password("hunter22").unwrap();
        assert_ne!(hashed, "hunter22");
        assert!(auth.verify_password("hunter22", &hashed).unwrap());
        assert!(!auth.verify_password("hunter23", &hashed).unwrap());
    }

    #[test]
    fn test_token_carries_subject() {
        let auth = service();
        let token = auth.issue_token("U1").unwrap();
        let claims = auth.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "U1");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let token = service().issue_token("U1").unwrap();
        let other = AuthService::new(AuthConfig {
            jwt_secret: "another-secret".into(),
            access_token_lifetime: 60,
            bcrypt_cost: 4,
        });
        assert!(other.verify_token(&token).is_err());
        assert!(other.verify_token("not-a-jwt").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let auth = AuthService::new(AuthConfig {
            jwt_secret: "test-secret".into(),
            // Past the default 60s leeway
            access_token_lifetime: -120,
            bcrypt_cost: 4,
        });
        let token = auth.issue_token("U1").unwrap();
        assert!(auth.verify_token(&token).is_err());
    }
}
