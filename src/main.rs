use anyhow::Context;
use tokio::net::TcpListener;

use blogql::App;
use blogql::config::Config;
use blogql::db;
use blogql::services::{LogFormat, init_tracing};

/// Password shared by the demo users
const DEMO_PASSWORD: &str = "password";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(LogFormat::from_env()?);

    let config = Config::from_env()?;
    tracing::info!("Starting blogql");

    let store = db::open_store(&config.database_url, config.database_max_connections).await?;
    let app = App::new(store, config.auth.clone(), config.pubsub_capacity);

    if config.seed_demo_data && app.seed_demo_data(DEMO_PASSWORD).await? {
        tracing::info!(password = DEMO_PASSWORD, "Demo users created");
    }

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);
    tracing::info!("GraphQL playground: http://localhost:{}/graphql", config.port);

    axum::serve(listener, app.router()).await?;

    Ok(())
}
