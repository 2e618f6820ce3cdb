//! Application configuration management

use std::env;

use anyhow::{Context, Result};

use crate::pubsub::DEFAULT_CAPACITY;
use crate::services::AuthConfig;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Interface to bind
    pub host: String,

    /// Server port
    pub port: u16,

    /// SQLite URL, or `memory` for the in-process store
    pub database_url: String,

    /// SQLite pool size
    pub database_max_connections: u32,

    /// Token signing and password hashing settings
    pub auth: AuthConfig,

    /// Per-subscriber event buffer
    pub pubsub_capacity: usize,

    /// Insert demo users, posts and comments into an empty store
    pub seed_demo_data: bool,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Call after tracing is initialised; a missing `JWT_SECRET` is reported
    /// as a warning.
    pub fn from_env() -> Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3001".to_string())
            .parse()
            .context("PORT must be a valid port number")?;

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/blog.db?mode=rwc".to_string());

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?;

        let pubsub_capacity = match env::var("PUBSUB_CHANNEL_CAPACITY") {
            Ok(value) => value
                .parse()
                .context("PUBSUB_CHANNEL_CAPACITY must be a positive integer")?,
            Err(_) => DEFAULT_CAPACITY,
        };

        let seed_demo_data = env::var("SEED_DEMO_DATA")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            host,
            port,
            database_url,
            database_max_connections,
            auth: AuthConfig::from_env(),
            pubsub_capacity,
            seed_demo_data,
        })
    }

    /// Address the HTTP server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
