use anyhow::Context;
use std::sync::Arc;

use emsi::{config::Settings, logging, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    logging::init(settings.environment);

    tracing::info!(environment = %settings.environment, "Starting EMSI back office");

    let db_pool = emsi::initialize(&settings)
        .await
        .context("Database initialization failed")?;

    let state = Arc::new(AppState { db_pool });
    let app = emsi::create_router(state, &settings);

    let listener = tokio::net::TcpListener::bind(&settings.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", settings.bind_address))?;

    tracing::info!(address = %settings.bind_address, "Listening");
    axum::serve(listener, app).await?;

    Ok(())
}
