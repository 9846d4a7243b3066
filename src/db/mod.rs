// Database module: connection, seeding and account/session queries

pub mod connection;
pub mod retry;
pub mod seed;
pub mod store;

use anyhow::Result;
use sqlx::{
    postgres::{PgPool, PgPoolOptions},
    Row,
};

use crate::error::StartupError;
use connection::ConnectionDescriptor;
use retry::RetryPolicy;

/// Open the connection pool, retrying transient failures
pub async fn connect(
    descriptor: &ConnectionDescriptor,
    max_connections: u32,
    retry: RetryPolicy,
) -> Result<PgPool, StartupError> {
    let options = descriptor.connect_options()?;
    let pool_options = PgPoolOptions::new()
        .max_connections(descriptor.pool_size(max_connections))
        .acquire_timeout(descriptor.connect_timeout());

    let options = &options;
    let pool_options = &pool_options;
    retry
        .run("connect", move || pool_options.clone().connect_with(options.clone()))
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, "Failed to connect to database");
            StartupError::Connect(e)
        })
}

// User models
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub login: String,
    pub employee_id: i64,
    pub first_name: String,
    pub last_name: String,
    #[sqlx(skip)]
    pub roles: Vec<String>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn has_any_role(&self, names: &[&str]) -> bool {
        self.roles.iter().any(|role| names.contains(&role.as_str()))
    }
}

/// Row of the administrator user list
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserSummary {
    pub id: i64,
    pub login: String,
    pub first_name: String,
    pub last_name: String,
    pub roles: String,
}

// Find credentials by login
pub async fn get_user_credentials(pool: &PgPool, login: &str) -> Result<Option<(i64, String)>> {
    let result = sqlx::query("SELECT id, password_hash FROM users WHERE login = $1")
        .bind(login)
        .fetch_optional(pool)
        .await?;

    Ok(result.map(|row| (row.get::<i64, _>("id"), row.get::<String, _>("password_hash"))))
}

// Get user by ID, with employee name and role names
pub async fn get_user_by_id(pool: &PgPool, user_id: i64) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT u.id, u.login, u.employee_id, e.first_name, e.last_name
         FROM users u
         JOIN employees e ON e.id = u.employee_id
         WHERE u.id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    let Some(mut user) = user else {
        return Ok(None);
    };

    user.roles = get_user_roles(pool, user.id).await?;
    Ok(Some(user))
}

pub async fn get_user_roles(pool: &PgPool, user_id: i64) -> Result<Vec<String>> {
    let roles = sqlx::query_scalar::<_, String>(
        "SELECT r.name
         FROM roles r
         JOIN user_roles ur ON ur.role_id = r.id
         WHERE ur.user_id = $1
         ORDER BY r.name",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(roles)
}

// List all users (admin only)
pub async fn list_users(pool: &PgPool) -> Result<Vec<UserSummary>> {
    let users = sqlx::query_as::<_, UserSummary>(
        "SELECT u.id, u.login, e.first_name, e.last_name,
                COALESCE(string_agg(r.name, ', ' ORDER BY r.name), '') AS roles
         FROM users u
         JOIN employees e ON e.id = u.employee_id
         LEFT JOIN user_roles ur ON ur.user_id = u.id
         LEFT JOIN roles r ON r.id = ur.role_id
         GROUP BY u.id, u.login, e.first_name, e.last_name
         ORDER BY u.login",
    )
    .fetch_all(pool)
    .await?;

    Ok(users)
}

// Session management
pub async fn create_session(pool: &PgPool, user_id: i64, hours: i64) -> Result<String> {
    let session_id = uuid::Uuid::new_v4().to_string();
    let expires_at = chrono::Utc::now() + chrono::Duration::hours(hours);

    sqlx::query("INSERT INTO sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
        .bind(&session_id)
        .bind(user_id)
        .bind(expires_at)
        .execute(pool)
        .await?;

    Ok(session_id)
}

// Validate session and return user_id
pub async fn validate_session(pool: &PgPool, session_id: &str) -> Result<Option<i64>> {
    let user_id = sqlx::query_scalar::<_, i64>(
        "SELECT user_id FROM sessions WHERE id = $1 AND expires_at > NOW()",
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await?;

    Ok(user_id)
}

// Delete session (logout)
pub async fn delete_session(pool: &PgPool, session_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE id = $1")
        .bind(session_id)
        .execute(pool)
        .await?;

    Ok(())
}

// Cleanup expired sessions
pub async fn cleanup_expired_sessions(pool: &PgPool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at < NOW()")
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
