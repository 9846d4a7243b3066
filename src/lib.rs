pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod security;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

use config::Settings;
use db::{
    connection::{self, ConnectionDescriptor},
    retry::RetryPolicy,
    seed,
    store::PgSeedStore,
};
use error::StartupError;

// Application state
pub struct AppState {
    pub db_pool: PgPool,
}

/// Resolve the connection, open the pool and seed the database.
/// Must finish before the listener is bound; every error is fatal.
pub async fn initialize(settings: &Settings) -> Result<PgPool, StartupError> {
    let descriptor = connection::resolve(
        settings.database_url.as_deref(),
        settings.connection_strings.primary.as_deref(),
    )
    .inspect_err(|e| tracing::error!(error = %e, "Error resolving database connection"))?;

    match &descriptor {
        ConnectionDescriptor::Url(target) if settings.environment.is_development() => {
            tracing::info!(
                host = %target.host,
                port = target.port,
                database = %target.database,
                "Database config from DATABASE_URL"
            );
        }
        ConnectionDescriptor::Url(_) => tracing::info!("Using DATABASE_URL"),
        ConnectionDescriptor::Named(_) => tracing::info!("Using fallback connection string"),
    }

    let retry = RetryPolicy::default();
    let pool = db::connect(&descriptor, settings.max_connections, retry).await?;

    {
        let store = PgSeedStore::new(&pool, retry);
        let report = seed::run(&store, settings.environment.schema_strategy()).await?;
        tracing::info!(
            roles_created = report.roles_created.len(),
            admin = ?report.admin,
            "Database initialization complete"
        );
    }

    Ok(pool)
}

/// Build the HTTP router. The default route renders the login action.
pub fn create_router(state: Arc<AppState>, settings: &Settings) -> Router {
    Router::new()
        .route("/", get(handlers::access::login_page))
        .route(
            auth::LOGIN_PATH,
            get(handlers::access::login_page).post(handlers::access::login_submit),
        )
        .route(auth::LOGOUT_PATH, post(handlers::access::logout))
        .route(auth::ACCESS_DENIED_PATH, get(handlers::access::denied_page))
        .route(auth::HOME_PATH, get(handlers::home::home_page))
        .route(handlers::admin::USERS_PATH, get(handlers::admin::users_page))
        .route("/admin/sessions/cleanup", post(handlers::admin::cleanup_sessions))
        .nest_service("/static", ServeDir::new(&settings.static_dir))
        .layer(middleware::from_fn(security::security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
